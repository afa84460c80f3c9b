//! Observable effects of a run: messages and target instruction calls.
//!
//! Messages are always recorded; with stdout echo they are printed as well.

use crate::value::RtValue;

/// A call of a declared function, recorded in program order.
#[derive(Clone, Debug, PartialEq)]
pub struct TargetCall {
    pub name: String,
    pub args: Vec<RtValue>,
}

/// Where messages go besides the record.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum MessageSink {
    #[default]
    Buffer,
    Stdout,
}

#[derive(Debug, Default)]
pub struct Output {
    sink: MessageSink,
    messages: Vec<String>,
    target_calls: Vec<TargetCall>,
}

impl Output {
    pub fn new(sink: MessageSink) -> Self {
        Output {
            sink,
            ..Self::default()
        }
    }

    pub fn message(&mut self, text: &str) {
        if self.sink == MessageSink::Stdout {
            println!("{text}");
        }
        self.messages.push(text.to_owned());
    }

    pub fn target_call(&mut self, name: &str, args: Vec<RtValue>) {
        tracing::debug!(name, "target call");
        self.target_calls.push(TargetCall {
            name: name.to_owned(),
            args,
        });
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn target_calls(&self) -> &[TargetCall] {
        &self.target_calls
    }

    /// Names of the recorded target calls, in order.
    pub fn target_call_names(&self) -> Vec<&str> {
        self.target_calls.iter().map(|call| call.name.as_str()).collect()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.target_calls.clear();
    }
}
