//! Frame-level tests against the simulated MCU through the public API

use std::sync::Arc;
use std::time::Duration;

use legos_transport::protocol::{cmd, gamepad_cfg, light_cfg, status, test_index, FRAME_SIZE};
use legos_transport::{
    decode, encode, CommandReport, Delivery, FrameError, ReplyMode, SimEvent, SimulatedMcu,
    Transport, TransportType,
};
use parking_lot::Mutex;

fn capture(sim: &SimulatedMcu) -> Arc<Mutex<Vec<CommandReport>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    sim.set_frame_handler(Some(Arc::new(move |frame: &[u8]| -> Result<(), FrameError> {
        sink.lock().push(decode(frame)?);
        Ok(())
    })));
    seen
}

#[tokio::test]
async fn user_profile_write_is_read_back() {
    let sim = SimulatedMcu::new();
    let seen = capture(&sim);
    let record = [2, 0x10, 0x20, 0x30, 0x40, 0x05];

    let set = encode(cmd::SET_LIGHT_CFG, light_cfg::USER_PROFILE_3, &record).unwrap();
    assert_eq!(sim.send(&set).await.unwrap(), FRAME_SIZE);
    assert_eq!(sim.profile(3), Some(record));

    let get = encode(cmd::GET_LIGHT_CFG, light_cfg::USER_PROFILE_3, &[]).unwrap();
    sim.send(&get).await.unwrap();

    let seen = seen.lock();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].data[0], status::ACCEPTED);
    assert_eq!(seen[1].cmd, cmd::GET_LIGHT_CFG);
    assert_eq!(seen[1].sub_cmd, light_cfg::USER_PROFILE_3);
    assert_eq!(&seen[1].data[..light_cfg::PROFILE_LEN], &record);
}

#[tokio::test]
async fn mode_and_profile_selection() {
    let sim = SimulatedMcu::new();
    let _seen = capture(&sim);

    let mode = encode(cmd::SET_LIGHT_CFG, light_cfg::MODE_SEL, &[1]).unwrap();
    let profile = encode(cmd::SET_LIGHT_CFG, light_cfg::PROFILE_SEL, &[2]).unwrap();
    sim.send(&mode).await.unwrap();
    sim.send(&profile).await.unwrap();

    assert_eq!(sim.light_mode(), 1);
    assert_eq!(sim.light_profile(), 2);
}

#[tokio::test]
async fn forced_value_overrides_gets_only() {
    let sim = SimulatedMcu::new();
    let seen = capture(&sim);
    sim.set_reply_mode(ReplyMode::ForcedValue(9));

    let get = encode(cmd::GET_PL_TEST, test_index::TP_VERSION, &[]).unwrap();
    let set = encode(cmd::SET_GAMEPAD_CFG, gamepad_cfg::POLL_RATE, &[1]).unwrap();
    sim.send(&get).await.unwrap();
    sim.send(&set).await.unwrap();

    let seen = seen.lock();
    assert_eq!(seen[0].data[0], 9);
    assert_eq!(seen[1].data[0], status::ACCEPTED);
    assert_eq!(sim.value(cmd::GET_GAMEPAD_CFG, gamepad_cfg::POLL_RATE), Some(1));
}

#[tokio::test]
async fn unknown_commands_get_no_reply() {
    let sim = SimulatedMcu::new();
    let seen = capture(&sim);

    let frame = encode(cmd::IC_RESET, 0, &[]).unwrap();
    assert_eq!(sim.send(&frame).await.unwrap(), FRAME_SIZE);

    assert!(seen.lock().is_empty());
    assert_eq!(sim.sent_count(), 1);
    assert_eq!(
        sim.events(),
        vec![SimEvent::Sent {
            command: cmd::IC_RESET,
            index: 0
        }]
    );
}

#[tokio::test]
async fn delayed_replies_keep_send_order() {
    let sim = SimulatedMcu::new();
    let seen = capture(&sim);
    sim.set_delivery(Delivery::Delayed(Duration::from_millis(5)));

    let first = encode(cmd::GET_GAMEPAD_CFG, gamepad_cfg::AUTO_SLEEP_TIME, &[]).unwrap();
    sim.send(&first).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    let second = encode(cmd::GET_GAMEPAD_CFG, gamepad_cfg::MOUSE_WHEEL_STEP, &[]).unwrap();
    sim.send(&second).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let seen = seen.lock();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].sub_cmd, gamepad_cfg::AUTO_SLEEP_TIME);
    assert_eq!(seen[0].data[0], 10);
    assert_eq!(seen[1].sub_cmd, gamepad_cfg::MOUSE_WHEEL_STEP);
    assert_eq!(seen[1].data[0], 5);
}

#[tokio::test]
async fn close_stops_delivery() {
    let sim = SimulatedMcu::new();
    let seen = capture(&sim);
    sim.close().await.unwrap();

    let frame = encode(cmd::GET_MCU_ID, 0, &[]).unwrap();
    sim.send(&frame).await.unwrap();

    assert!(seen.lock().is_empty());
    assert!(sim.inject(&frame).is_none());
}

#[tokio::test]
async fn simulator_reports_itself() {
    let sim = SimulatedMcu::new();
    let info = sim.device_info();
    assert_eq!(info.transport_type, TransportType::Simulated);
    assert!(!info.transport_type.is_hardware());
    assert!(sim.is_connected().await);
}
