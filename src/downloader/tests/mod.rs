use super::*;
use crate::config::MockOutcome;
use crate::error::UnavailableReason;
use crate::types::{Asset, JobStatus};
use std::time::Duration;
use super::test_helpers::{
    HangingBackend, VIDEO_URL, create_test_downloader, create_test_downloader_with, mock,
    wait_for_status, wait_for_terminal,
};

mod control;
mod jobs;
