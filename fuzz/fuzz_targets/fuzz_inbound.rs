//! Fuzz target: `InboundMessage::new` + `ControlLoop::handle_message`
//!
//! Arbitrary broker messages must never panic the loop, and only routed
//! commands may reach the outputs.
//!
//! cargo fuzz run fuzz_inbound

#![no_main]

use libfuzzer_sys::fuzz_target;
use motion_node::app::control_loop::ControlLoop;
use motion_node::app::events::NodeEvent;
use motion_node::app::motion::MotionMonitor;
use motion_node::app::ports::{EventSink, InboundMessage, OutputPort};
use motion_node::config::NodeConfig;
use motion_node::error::OutputError;

#[derive(Default)]
struct CountingOutputs(usize);

impl OutputPort for CountingOutputs {
    fn set_switch(&mut self, _on: bool) -> Result<(), OutputError> {
        self.0 += 1;
        Ok(())
    }

    fn set_brightness(&mut self, _duty: u8) -> Result<(), OutputError> {
        self.0 += 1;
        Ok(())
    }
}

struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &NodeEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let Some((&split, rest)) = data.split_first() else {
        return;
    };
    let (topic, payload) = rest.split_at(usize::from(split).min(rest.len()));
    let Ok(topic) = core::str::from_utf8(topic) else {
        return;
    };
    let Ok(msg) = InboundMessage::new(topic, payload) else {
        return;
    };

    let mut control = ControlLoop::new(&NodeConfig::default(), MotionMonitor::new());
    let mut outputs = CountingOutputs::default();
    control.handle_message(&msg, &mut outputs, &mut NullSink);

    assert!(outputs.0 <= 1);
    assert_eq!(outputs.0 as u32, control.stats().commands_applied);
});
