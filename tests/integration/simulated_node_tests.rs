//! Whole-node scenarios on the host simulation adapters: simulated WiFi
//! and broker, simulated PIR edge, real control loop.

use motion_node::adapters::mqtt::MqttSession;
use motion_node::adapters::wifi::WifiAdapter;
use motion_node::app::control_loop::ControlLoop;
use motion_node::app::events::NodeEvent;
use motion_node::app::motion::MotionMonitor;
use motion_node::app::ports::SessionPort;
use motion_node::config::NodeConfig;
use motion_node::drivers::motion_sensor::MotionSensor;
use motion_node::error::SessionError;
use motion_node::pins;

use crate::mock_hw::{MockClock, MockDelay, MockOutputs, OutputCall, RecordingSink};

struct Node {
    control: ControlLoop,
    pir: MotionSensor,
    session: MqttSession<WifiAdapter>,
    outputs: MockOutputs,
    clock: MockClock,
    delay: MockDelay,
    sink: RecordingSink,
}

impl Node {
    fn boot() -> Self {
        let config = NodeConfig::default();
        let monitor = MotionMonitor::new();
        let pir = MotionSensor::attach(pins::PIR_GPIO, monitor.trigger()).unwrap();
        let wifi = WifiAdapter::new(&config).unwrap();
        Self {
            control: ControlLoop::new(&config, monitor),
            pir,
            session: MqttSession::new(wifi, &config),
            outputs: MockOutputs::new(),
            clock: MockClock::at(0),
            delay: MockDelay::default(),
            sink: RecordingSink::default(),
        }
    }

    fn run_at(&mut self, now_ms: u32) {
        self.clock.set(now_ms);
        self.control.run_once(
            &mut self.session,
            &mut self.outputs,
            &self.clock,
            &mut self.delay,
            &mut self.sink,
        );
    }
}

#[test]
fn wifi_outage_at_boot_is_retried_with_backoff() {
    let mut node = Node::boot();
    node.session.link_mut().sim_fail_next(2);
    node.run_at(0);

    assert_eq!(node.delay.delays_ms, vec![5_000, 5_000]);
    assert_eq!(
        node.sink.count(|e| matches!(
            e,
            NodeEvent::ConnectFailed {
                error: SessionError::NetworkDown,
                ..
            }
        )),
        2
    );
    assert!(node.session.is_connected());
    assert_eq!(node.session.sim_subscriptions(), ["home/node1/led1", "home/node1/led2"]);
}

#[test]
fn motion_and_commands_end_to_end() {
    let mut node = Node::boot();
    node.run_at(0);

    node.session.sim_deliver("home/node1/led1", b"on");
    node.session.sim_deliver("home/node1/led2", b"4");
    node.pir.simulate_edge(100);
    node.run_at(110);

    assert_eq!(
        node.outputs.calls,
        vec![OutputCall::Switch(true), OutputCall::Brightness(170)]
    );
    assert_eq!(
        node.session.sim_published(),
        [(
            "home/node1/motion".to_owned(),
            br#"{"motion": "Motion detected"}"#.to_vec()
        )]
    );

    node.run_at(10_101);
    assert_eq!(node.session.sim_published().len(), 2);
    assert_eq!(
        node.session.sim_published()[1].1,
        br#"{"motion": "No motion detected"}"#.to_vec()
    );
}

#[test]
fn broker_drop_resubscribes_on_fresh_session() {
    let mut node = Node::boot();
    node.run_at(0);
    node.session.sim_drop();
    node.session.sim_refuse_next(1);
    node.run_at(10);

    assert_eq!(node.delay.delays_ms, vec![5_000]);
    assert_eq!(node.session.sim_subscriptions().len(), 2);
    assert_eq!(node.control.stats().sessions_established, 2);

    node.session.sim_deliver("home/node1/led1", b"off");
    node.run_at(20);
    assert_eq!(node.outputs.calls, vec![OutputCall::Switch(false)]);
}

#[test]
fn wifi_drop_surfaces_as_session_drop() {
    let mut node = Node::boot();
    node.run_at(0);
    node.session.link_mut().sim_drop();
    node.run_at(10);

    assert!(node.sink.events.contains(&NodeEvent::LinkLost));
    assert!(node.session.is_connected());
}

#[test]
fn pir_armed_after_first_session_reports_first_edge() {
    let config = NodeConfig::default();
    let mut session = MqttSession::new(WifiAdapter::new(&config).unwrap(), &config);
    let mut control = ControlLoop::new(&config, MotionMonitor::new());
    let mut sink = RecordingSink::default();
    let mut delay = MockDelay::default();

    control.ensure_connected(&mut session, &mut delay, &mut sink);
    assert_eq!(session.sim_subscriptions(), ["home/node1/led1", "home/node1/led2"]);

    let pir = MotionSensor::attach(pins::PIR_GPIO, control.monitor().trigger()).unwrap();
    pir.simulate_edge(5);
    let clock = MockClock::at(10);
    control.run_once(&mut session, &mut MockOutputs::new(), &clock, &mut delay, &mut sink);

    assert_eq!(
        session.sim_published(),
        [(
            "home/node1/motion".to_owned(),
            br#"{"motion": "Motion detected"}"#.to_vec()
        )]
    );
}

#[test]
fn edge_before_first_session_is_not_reported() {
    let mut node = Node::boot();
    node.pir.simulate_edge(0);
    node.run_at(1);
    assert!(node.session.sim_published().is_empty());
}
