// SPDX-License-Identifier: MIT

//! Raw answers as produced by the host UI

use serde::{Deserialize, Serialize};

/// An image already captured and encoded by the host
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedImage {
    /// Opaque handle, used as the upload file name
    pub handle: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    #[serde(default, skip_serializing)]
    pub data: Vec<u8>,
}

fn default_content_type() -> String {
    "image/jpeg".to_string()
}

impl CapturedImage {
    pub fn new(handle: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            handle: handle.into(),
            content_type: content_type.into(),
            data,
        }
    }
}

/// Unvalidated answer for the current node
///
/// Only the field matching the node kind is read; the rest are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAnswer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_option: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_options: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<CapturedImage>,
    /// Button pressed to leave a display node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button: Option<usize>,
}

impl RawAnswer {
    pub fn choice(index: usize) -> Self {
        Self {
            selected_option: Some(index),
            ..Default::default()
        }
    }

    pub fn choices(indices: impl IntoIterator<Item = usize>) -> Self {
        Self {
            selected_options: Some(indices.into_iter().collect()),
            ..Default::default()
        }
    }

    pub fn text(answer: impl Into<String>) -> Self {
        Self {
            answer: Some(answer.into()),
            ..Default::default()
        }
    }

    pub fn scale(value: f64) -> Self {
        Self {
            value: Some(value),
            ..Default::default()
        }
    }

    pub fn images(images: Vec<CapturedImage>) -> Self {
        Self {
            images,
            ..Default::default()
        }
    }

    /// Acknowledge a display node without buttons
    pub fn ack() -> Self {
        Self::default()
    }

    /// Leave a display node through one of its buttons
    pub fn button(index: usize) -> Self {
        Self {
            button: Some(index),
            ..Default::default()
        }
    }
}
