// SPDX-License-Identifier: MIT

//! Branching step-by-step workflows (evaluations and trainings)
//!
//! - `flow` - node graphs, answer formatting, the navigator and the completion payload
//! - `remote` - persistence of completed walks
//! - `session` - a navigator bound to a session id and a persistence adapter
//! - `script` - scripted walks used by the CLI

pub mod flow;
pub mod remote;
pub mod script;
pub mod session;
