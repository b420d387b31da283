//! Inbound command routing through the control loop.

use motion_node::app::commands::{BrightnessLevel, Command};
use motion_node::app::control_loop::ControlLoop;
use motion_node::app::events::NodeEvent;
use motion_node::app::motion::MotionMonitor;
use motion_node::config::{BRIGHTNESS_LEVELS, NodeConfig};
use motion_node::app::ports::{InboundMessage, PAYLOAD_CAP};
use motion_node::error::{RouteError, SessionError};

use crate::mock_hw::{MockClock, MockDelay, MockOutputs, MockSession, OutputCall, RecordingSink};

const SWITCH_TOPIC: &str = "home/node1/led1";
const BRIGHTNESS_TOPIC: &str = "home/node1/led2";

struct Rig {
    control: ControlLoop,
    session: MockSession,
    outputs: MockOutputs,
    clock: MockClock,
    delay: MockDelay,
    sink: RecordingSink,
}

impl Rig {
    fn connected() -> Self {
        let mut rig = Self {
            control: ControlLoop::new(&NodeConfig::default(), MotionMonitor::new()),
            session: MockSession::new(),
            outputs: MockOutputs::new(),
            clock: MockClock::at(0),
            delay: MockDelay::default(),
            sink: RecordingSink::default(),
        };
        rig.run();
        rig
    }

    fn run(&mut self) {
        self.clock.advance(10);
        self.control.run_once(
            &mut self.session,
            &mut self.outputs,
            &self.clock,
            &mut self.delay,
            &mut self.sink,
        );
    }

    fn send(&mut self, topic: &str, payload: &[u8]) {
        self.session.deliver(topic, payload);
        self.run();
    }
}

#[test]
fn switch_follows_on_off() {
    let mut rig = Rig::connected();
    rig.send(SWITCH_TOPIC, b"on");
    assert_eq!(rig.outputs.switch_on(), Some(true));
    rig.send(SWITCH_TOPIC, b"off");
    assert_eq!(rig.outputs.switch_on(), Some(false));
}

#[test]
fn repeated_command_is_written_again() {
    let mut rig = Rig::connected();
    rig.send(SWITCH_TOPIC, b"on");
    rig.send(SWITCH_TOPIC, b"on");
    assert_eq!(
        rig.outputs.calls,
        vec![OutputCall::Switch(true), OutputCall::Switch(true)]
    );
}

#[test]
fn every_level_maps_to_its_table_duty() {
    let mut rig = Rig::connected();
    for (level, duty) in BRIGHTNESS_LEVELS.iter().enumerate() {
        rig.send(BRIGHTNESS_TOPIC, level.to_string().as_bytes());
        assert_eq!(rig.outputs.duty(), Some(*duty), "level {level}");
    }
}

#[test]
fn out_of_range_level_leaves_output_untouched() {
    let mut rig = Rig::connected();
    rig.send(BRIGHTNESS_TOPIC, b"3");
    rig.send(BRIGHTNESS_TOPIC, b"6");
    rig.send(BRIGHTNESS_TOPIC, b"-1");

    assert_eq!(rig.outputs.calls, vec![OutputCall::Brightness(100)]);
    assert_eq!(rig.control.stats().commands_ignored, 2);
    assert!(rig.sink.events.contains(&NodeEvent::CommandIgnored {
        topic: heapless::String::try_from(BRIGHTNESS_TOPIC).unwrap(),
        error: RouteError::LevelOutOfRange(6),
    }));
}

#[test]
fn non_numeric_level_turns_dimmer_off() {
    let mut rig = Rig::connected();
    rig.send(BRIGHTNESS_TOPIC, b"5");
    rig.send(BRIGHTNESS_TOPIC, b"bright");
    assert_eq!(
        rig.outputs.calls,
        vec![OutputCall::Brightness(250), OutputCall::Brightness(0)]
    );
    assert!(rig.sink.events.contains(&NodeEvent::CommandApplied(
        Command::SetBrightnessLevel(BrightnessLevel::new(0).unwrap())
    )));
}

#[test]
fn unrecognized_switch_payload_is_ignored() {
    let mut rig = Rig::connected();
    rig.send(SWITCH_TOPIC, b"toggle");
    rig.send(SWITCH_TOPIC, b"ON");
    assert!(rig.outputs.calls.is_empty());
    assert_eq!(
        rig.sink.count(|e| matches!(
            e,
            NodeEvent::CommandIgnored {
                error: RouteError::UnrecognizedPayload,
                ..
            }
        )),
        2
    );
}

#[test]
fn messages_apply_in_arrival_order() {
    let mut rig = Rig::connected();
    rig.session.deliver(SWITCH_TOPIC, b"on");
    rig.session.deliver(BRIGHTNESS_TOPIC, b"2");
    rig.session.deliver(SWITCH_TOPIC, b"off");
    rig.run();
    assert_eq!(
        rig.outputs.calls,
        vec![
            OutputCall::Switch(true),
            OutputCall::Brightness(55),
            OutputCall::Switch(false),
        ]
    );
}

#[test]
fn oversized_brightness_payload_is_dropped_not_cut() {
    let mut rig = Rig::connected();
    // 64 zeros then a 9: cut at the buffer size it would read as level 0.
    let mut payload = "0".repeat(PAYLOAD_CAP);
    payload.push('9');
    assert_eq!(
        InboundMessage::new(BRIGHTNESS_TOPIC, payload.as_bytes()),
        Err(SessionError::PayloadTooLong)
    );

    rig.send(BRIGHTNESS_TOPIC, payload.as_bytes());
    assert!(rig.outputs.calls.is_empty());
    assert_eq!(rig.control.stats().commands_applied, 0);
}
