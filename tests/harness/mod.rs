// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Shared fixtures for the intake tests.
//!
//! Each test gets its own data directory and mailer, so tests can run in
//! parallel without sharing record files.

#![allow(dead_code)]

pub mod generators;
pub mod mailers;

use mailers::RecordingMailer;
use parish_intake::{
    config::Config,
    metrics::Metrics,
    notify::{Mailer, NotificationDispatcher},
    pipeline::IntakePipeline,
};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Default configuration rooted at `data_dir`.
pub fn config_in(data_dir: &Path) -> Config {
    Config {
        data_dir: data_dir.to_path_buf(),
        ..Default::default()
    }
}

pub fn pipeline_with(config: &Config, mailer: Arc<dyn Mailer>) -> IntakePipeline {
    let dispatcher = NotificationDispatcher::new(&config.notify, mailer);
    IntakePipeline::new(config, dispatcher, Metrics::new().unwrap())
}

/// A pipeline over a fresh temporary directory with a recording mailer.
pub struct TestIntake {
    pub dir: TempDir,
    pub config: Config,
    pub pipeline: IntakePipeline,
    pub mailer: Arc<RecordingMailer>,
}

impl TestIntake {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    pub fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        adjust(&mut config);
        let mailer = Arc::new(RecordingMailer::default());
        let pipeline = pipeline_with(&config, mailer.clone());
        Self {
            dir,
            config,
            pipeline,
            mailer,
        }
    }
}
