// SPDX-License-Identifier: MIT

//! Response formatter - turns raw UI answers into versioned responses
//!
//! One branch per node kind. Formatting never mutates anything; a
//! rejected answer leaves the caller's state untouched.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use super::answer::RawAnswer;
use super::error::FlowError;
use super::node::{Node, NodeBody};
use super::response::{Attachment, Response, ResponseMetadata, ResponsePayload};

/// Tolerance used when checking scale bounds and step alignment
const SCALE_EPSILON: f64 = 1e-9;

/// Format `raw` for `node`, stamping the current time
pub fn format(node: &Node, raw: &RawAnswer) -> Result<Response, FlowError> {
    format_at(node, raw, Utc::now())
}

/// Format `raw` for `node` with an explicit capture time
pub fn format_at(
    node: &Node,
    raw: &RawAnswer,
    captured_at: DateTime<Utc>,
) -> Result<Response, FlowError> {
    let payload = match &node.body {
        NodeBody::SingleChoice { options } => format_single_choice(node, options, raw)?,
        NodeBody::MultipleChoice {
            options,
            allow_empty,
        } => format_multiple_choice(node, options, *allow_empty, raw)?,
        NodeBody::Text {} => format_text(node, raw)?,
        NodeBody::Scale { min, max, step } => format_scale(node, *min, *max, *step, raw)?,
        NodeBody::Image { .. } => format_images(node, raw),
        NodeBody::Description { .. }
        | NodeBody::Video { .. }
        | NodeBody::ImageDisplay { .. }
        | NodeBody::TextDisplay { .. }
        | NodeBody::WeeklyPlan { .. } => format_acknowledgement(node, raw)?,
        NodeBody::Result {} => return Err(FlowError::TerminalNode { node_id: node.id }),
    };

    Ok(Response {
        node_id: node.id,
        kind: node.kind(),
        captured_at,
        payload,
        metadata: ResponseMetadata::default(),
    })
}

fn format_single_choice(
    node: &Node,
    options: &[String],
    raw: &RawAnswer,
) -> Result<ResponsePayload, FlowError> {
    let index = raw
        .selected_option
        .ok_or(FlowError::MissingAnswer { node_id: node.id })?;
    let option = options.get(index).ok_or_else(|| {
        FlowError::invalid_answer(
            node.id,
            format!("option {} out of range ({} options)", index, options.len()),
        )
    })?;
    Ok(ResponsePayload::SingleChoice {
        selected_option: index,
        option: option.clone(),
    })
}

fn format_multiple_choice(
    node: &Node,
    options: &[String],
    allow_empty: bool,
    raw: &RawAnswer,
) -> Result<ResponsePayload, FlowError> {
    if raw.selected_options.is_none() && !allow_empty {
        return Err(FlowError::MissingAnswer { node_id: node.id });
    }
    let selected: BTreeSet<usize> = raw
        .selected_options
        .iter()
        .flatten()
        .copied()
        .collect();

    if selected.is_empty() && !allow_empty {
        return Err(FlowError::invalid_answer(
            node.id,
            "at least one option must be selected",
        ));
    }
    if let Some(bad) = selected.iter().find(|&&i| i >= options.len()) {
        return Err(FlowError::invalid_answer(
            node.id,
            format!("option {} out of range ({} options)", bad, options.len()),
        ));
    }

    Ok(ResponsePayload::MultipleChoice {
        options: selected.iter().map(|&i| options[i].clone()).collect(),
        selected_options: selected.into_iter().collect(),
    })
}

fn format_text(node: &Node, raw: &RawAnswer) -> Result<ResponsePayload, FlowError> {
    let answer = raw.answer.as_deref().map(str::trim).unwrap_or_default();
    if answer.is_empty() {
        return Err(FlowError::MissingAnswer { node_id: node.id });
    }
    Ok(ResponsePayload::Text {
        answer: answer.to_string(),
    })
}

fn format_scale(
    node: &Node,
    min: f64,
    max: f64,
    step: f64,
    raw: &RawAnswer,
) -> Result<ResponsePayload, FlowError> {
    let value = raw
        .value
        .ok_or(FlowError::MissingAnswer { node_id: node.id })?;
    if !value.is_finite() || value < min - SCALE_EPSILON || value > max + SCALE_EPSILON {
        return Err(FlowError::invalid_answer(
            node.id,
            format!("value {} outside [{}, {}]", value, min, max),
        ));
    }

    // Snap onto the step grid anchored at min, staying inside the bounds
    let steps = ((value - min) / step).round();
    let snapped = (min + steps * step).clamp(min, max);
    Ok(ResponsePayload::Scale { value: snapped })
}

fn format_images(node: &Node, raw: &RawAnswer) -> ResponsePayload {
    let attachments = raw
        .images
        .iter()
        .enumerate()
        .map(|(idx, image)| Attachment {
            part: format!("node-{}-{}", node.id, idx),
            handle: image.handle.clone(),
            content_type: image.content_type.clone(),
            data: image.data.clone(),
        })
        .collect();
    ResponsePayload::Image { attachments }
}

fn format_acknowledgement(node: &Node, raw: &RawAnswer) -> Result<ResponsePayload, FlowError> {
    let buttons = node.buttons();
    if buttons.is_empty() {
        return Ok(ResponsePayload::Acknowledged { button: None });
    }
    match raw.button {
        Some(idx) if idx < buttons.len() => Ok(ResponsePayload::Acknowledged { button: Some(idx) }),
        Some(idx) => Err(FlowError::invalid_answer(
            node.id,
            format!("button {} out of range ({} buttons)", idx, buttons.len()),
        )),
        None => Err(FlowError::MissingAnswer { node_id: node.id }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::answer::CapturedImage;
    use crate::flow::node::{Button, NodeKind};
    use crate::flow::response::RESPONSE_SCHEMA_VERSION;

    fn single(options: &[&str]) -> Node {
        Node::new(
            1,
            "pick one",
            NodeBody::SingleChoice {
                options: options.iter().map(|s| s.to_string()).collect(),
            },
        )
    }

    fn multi(allow_empty: bool) -> Node {
        Node::new(
            2,
            "pick many",
            NodeBody::MultipleChoice {
                options: vec!["a".into(), "b".into(), "c".into()],
                allow_empty,
            },
        )
    }

    fn scale() -> Node {
        Node::new(
            3,
            "rate",
            NodeBody::Scale {
                min: 0.0,
                max: 10.0,
                step: 0.5,
            },
        )
    }

    #[test]
    fn test_single_choice_valid() {
        let response = format(&single(&["A", "B"]), &RawAnswer::choice(1)).unwrap();
        assert_eq!(response.node_id, 1);
        assert_eq!(response.kind, NodeKind::SingleChoice);
        assert_eq!(response.metadata.version, RESPONSE_SCHEMA_VERSION);
        assert_eq!(
            response.payload,
            ResponsePayload::SingleChoice {
                selected_option: 1,
                option: "B".into()
            }
        );
    }

    #[test]
    fn test_single_choice_out_of_range() {
        let err = format(&single(&["A", "B"]), &RawAnswer::choice(2)).unwrap_err();
        assert!(matches!(err, FlowError::InvalidAnswer { node_id: 1, .. }));
    }

    #[test]
    fn test_single_choice_missing() {
        let err = format(&single(&["A"]), &RawAnswer::text("A")).unwrap_err();
        assert_eq!(err, FlowError::MissingAnswer { node_id: 1 });
    }

    #[test]
    fn test_multiple_choice_dedup_and_sort() {
        let response = format(&multi(false), &RawAnswer::choices([2, 0, 2])).unwrap();
        assert_eq!(
            response.payload,
            ResponsePayload::MultipleChoice {
                selected_options: vec![0, 2],
                options: vec!["a".into(), "c".into()]
            }
        );
    }

    #[test]
    fn test_multiple_choice_empty_policy() {
        assert!(matches!(
            format(&multi(false), &RawAnswer::choices([])),
            Err(FlowError::InvalidAnswer { .. })
        ));
        assert_eq!(
            format(&multi(false), &RawAnswer::ack()).unwrap_err(),
            FlowError::MissingAnswer { node_id: 2 }
        );
        let response = format(&multi(true), &RawAnswer::ack()).unwrap();
        assert_eq!(
            response.payload,
            ResponsePayload::MultipleChoice {
                selected_options: vec![],
                options: vec![]
            }
        );
    }

    #[test]
    fn test_multiple_choice_out_of_range() {
        assert!(matches!(
            format(&multi(false), &RawAnswer::choices([0, 3])),
            Err(FlowError::InvalidAnswer { node_id: 2, .. })
        ));
    }

    #[test]
    fn test_text_is_trimmed() {
        let node = Node::new(4, "tell", NodeBody::Text {});
        let response = format(&node, &RawAnswer::text("  hello \n")).unwrap();
        assert_eq!(
            response.payload,
            ResponsePayload::Text {
                answer: "hello".into()
            }
        );
    }

    #[test]
    fn test_blank_text_is_no_answer() {
        let node = Node::new(4, "tell", NodeBody::Text {});
        assert_eq!(
            format(&node, &RawAnswer::text("   ")).unwrap_err(),
            FlowError::MissingAnswer { node_id: 4 }
        );
        assert_eq!(
            format(&node, &RawAnswer::ack()).unwrap_err(),
            FlowError::MissingAnswer { node_id: 4 }
        );
    }

    #[test]
    fn test_scale_snaps_to_step() {
        let response = format(&scale(), &RawAnswer::scale(7.3)).unwrap();
        assert_eq!(response.payload, ResponsePayload::Scale { value: 7.5 });

        let response = format(&scale(), &RawAnswer::scale(10.0)).unwrap();
        assert_eq!(response.payload, ResponsePayload::Scale { value: 10.0 });
    }

    #[test]
    fn test_scale_snap_stays_within_max() {
        let node = Node::new(
            5,
            "rate",
            NodeBody::Scale {
                min: 1.0,
                max: 4.0,
                step: 2.0,
            },
        );
        // 4.0 rounds to the 5.0 grid point, which is clamped back to max
        let response = format(&node, &RawAnswer::scale(4.0)).unwrap();
        assert_eq!(response.payload, ResponsePayload::Scale { value: 4.0 });
    }

    #[test]
    fn test_scale_out_of_range_rejected() {
        assert!(matches!(
            format(&scale(), &RawAnswer::scale(10.5)),
            Err(FlowError::InvalidAnswer { node_id: 3, .. })
        ));
        assert!(matches!(
            format(&scale(), &RawAnswer::scale(-0.1)),
            Err(FlowError::InvalidAnswer { .. })
        ));
        assert!(matches!(
            format(&scale(), &RawAnswer::scale(f64::NAN)),
            Err(FlowError::InvalidAnswer { .. })
        ));
    }

    #[test]
    fn test_images_get_part_names() {
        let node = Node::new(6, "photo", NodeBody::Image { max_images: Some(1) });
        let raw = RawAnswer::images(vec![
            CapturedImage::new("front.jpg", "image/jpeg", vec![1]),
            CapturedImage::new("side.png", "image/png", vec![2]),
        ]);
        let response = format(&node, &raw).unwrap();
        match response.payload {
            ResponsePayload::Image { attachments } => {
                // max_images is the host's concern
                assert_eq!(attachments.len(), 2);
                assert_eq!(attachments[0].part, "node-6-0");
                assert_eq!(attachments[1].part, "node-6-1");
                assert_eq!(attachments[1].content_type, "image/png");
                assert_eq!(attachments[1].data, vec![2]);
            }
            other => panic!("Expected image payload, got {:?}", other),
        }
    }

    #[test]
    fn test_display_nodes_acknowledge() {
        let node = Node::new(7, "watch", NodeBody::Video { url: None, buttons: vec![] });
        let response = format(&node, &RawAnswer::ack()).unwrap();
        assert_eq!(response.payload, ResponsePayload::Acknowledged { button: None });

        let plan = Node::new(8, "plan", NodeBody::WeeklyPlan { days: vec![] });
        assert!(format(&plan, &RawAnswer::text("ignored")).is_ok());
    }

    #[test]
    fn test_buttons_require_valid_choice() {
        let node = Node::new(
            9,
            "choose",
            NodeBody::Description {
                buttons: vec![
                    Button {
                        label: "one".into(),
                        next_node_id: None,
                    },
                    Button {
                        label: "two".into(),
                        next_node_id: None,
                    },
                ],
            },
        );
        let response = format(&node, &RawAnswer::button(1)).unwrap();
        assert_eq!(response.button(), Some(1));
        assert!(matches!(
            format(&node, &RawAnswer::button(2)),
            Err(FlowError::InvalidAnswer { .. })
        ));
        assert_eq!(
            format(&node, &RawAnswer::ack()).unwrap_err(),
            FlowError::MissingAnswer { node_id: 9 }
        );
    }

    #[test]
    fn test_result_is_never_formatted() {
        let node = Node::new(10, "done", NodeBody::Result {});
        assert_eq!(
            format(&node, &RawAnswer::ack()).unwrap_err(),
            FlowError::TerminalNode { node_id: 10 }
        );
    }

    #[test]
    fn test_format_at_uses_given_time() {
        let at = DateTime::parse_from_rfc3339("2024-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let response = format_at(&single(&["A"]), &RawAnswer::choice(0), at).unwrap();
        assert_eq!(response.captured_at, at);
    }
}
