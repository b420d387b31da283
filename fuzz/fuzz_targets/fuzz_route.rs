//! Fuzz target: `CommandRouter::route`
//!
//! Splits the input into a topic and a payload and checks that routing
//! never panics and only ever yields a command for the two control topics.
//!
//! cargo fuzz run fuzz_route

#![no_main]

use libfuzzer_sys::fuzz_target;
use motion_node::app::commands::Command;
use motion_node::app::router::{CommandRouter, TopicTable};
use motion_node::config::NodeConfig;

fuzz_target!(|data: &[u8]| {
    let router = CommandRouter::new(TopicTable::from_config(&NodeConfig::default()));

    // First byte picks the split point; topics must be UTF-8 on the wire.
    let Some((&split, rest)) = data.split_first() else {
        return;
    };
    let split = usize::from(split).min(rest.len());
    let (topic, payload) = rest.split_at(split);
    let Ok(topic) = core::str::from_utf8(topic) else {
        return;
    };

    match router.route(topic, payload) {
        Ok(Command::SetSwitch(_)) => assert_eq!(topic, "home/node1/led1"),
        Ok(Command::SetBrightnessLevel(level)) => {
            assert_eq!(topic, "home/node1/led2");
            assert!(level.get() <= 5);
        }
        Err(_) => {}
    }
});
