//! End-to-end scenarios: compile a telemetry config, bring the bus up on a
//! loopback driver, exchange frames in both directions, and check the raw
//! wire bytes against hand-computed encodings.

mod helpers;

use std::cell::Cell;
use std::rc::Rc;

use can_telem::builder::reader::MemoryReader;
use can_telem::builder::TelemetryBuilder;
use can_telem::bus::frame::RawCanFrame;
use can_telem::bus::CanBus;
use can_telem::core::BaudRate;
use embassy_time::Duration;

use helpers::LoopbackDriver;

const CONFIG: &str = "\
# vehicle telemetry map
!! logPeriodMs 10
!! wirelessPeriodMs 200

> FRONT_ECU
>> WHEEL_SPEEDS 0x100 4
>>> FL_SPEED uint16 0 16 0.1 0
>>> FR_SPEED uint16 16 16 0.1 0
>> BRAKE_PRESSURE 0x101 3
>>> FRONT_PSI int16 0 12 0.25 -10 signed
>>> STATUS uint8 12 4 1 0
>>>> OK 0
>>>> FAULT 1

> REAR_ECU
>> COOLANT 0x200 2
>>> TEMP_C int16 0 16 0.5 -40 signed big
";

#[test]
fn test_config_to_wire() {
    let mut driver = LoopbackDriver::new();
    {
        let mut bus = CanBus::new(&mut driver, BaudRate::Kbps500);

        // 1. Compile the config into the bus.
        let options = TelemetryBuilder::new(MemoryReader::new(CONFIG))
            .build(&mut bus)
            .expect("config should compile");
        assert_eq!(options.log_period(), Duration::from_millis(10));
        assert_eq!(options.wireless_period(), Duration::from_millis(200));
        assert_eq!(bus.message_count(), 3);
        assert!(bus.validate_messages());

        // 2. Bring the bus up; the schema freezes and the driver installs.
        bus.initialize().expect("initialization should succeed");
        assert!(bus.is_initialized());
        assert_eq!(bus.driver().installed, Some(BaudRate::Kbps500));

        // 3. Encode wheel speeds and check the transmitted wire bytes.
        {
            let wheels = bus.message(0x100).expect("message 0x100");
            let fl = wheels.signal("FL_SPEED").expect("FL_SPEED");
            let fr = wheels.signal("FR_SPEED").expect("FR_SPEED");
            wheels.set_value(fl, 123.4f64).expect("set FL_SPEED");
            wheels.set_value(fr, 200.0f64).expect("set FR_SPEED");
        }
        bus.send(0x100).expect("send 0x100");
        {
            let frame = bus.driver().sent.last().expect("one sent frame");
            assert_eq!(frame.id, 0x100);
            assert!(!frame.extended);
            assert_eq!(frame.len, 4);
            // raw(123.4 / 0.1) = 1234 = 0x04D2, raw(200.0 / 0.1) = 2000 = 0x07D0
            assert_eq!(frame.payload(), &[0xD2, 0x04, 0xD0, 0x07]);
        }

        // 4. Signed sub-byte signal survives an encode/decode round trip.
        {
            let brakes = bus.message(0x101).expect("message 0x101");
            let psi = brakes.signal("FRONT_PSI").expect("FRONT_PSI");
            brakes.set_value(psi, -5.0f64).expect("set FRONT_PSI");
            let back: f64 = brakes.value(psi).expect("read FRONT_PSI");
            assert_eq!(back, -5.0);
        }

        // 5. Big-endian signal lands most-significant byte first on the wire.
        {
            let coolant = bus.message(0x200).expect("message 0x200");
            let temp = coolant.signal("TEMP_C").expect("TEMP_C");
            coolant.set_value(temp, 25.0f64).expect("set TEMP_C");
        }
        bus.send(0x200).expect("send 0x200");
        {
            let frame = bus.driver().sent.last().expect("sent coolant frame");
            // raw((25 + 40) / 0.5) = 130 = 0x0082, byte-swapped to [0x00, 0x82]
            assert_eq!(frame.payload(), &[0x00, 0x82]);
            let coolant = bus.message(0x200).expect("message 0x200");
            assert_eq!(coolant.value_of::<f64>("TEMP_C"), Some(25.0));
        }
    }

    // 6. Dropping the bus releases the transport.
    assert!(driver.uninstalled);
}

#[test]
fn test_wire_to_values() {
    let mut driver = LoopbackDriver::new();
    // FRONT_PSI = 2.5 -> raw 50 in bits 0..12; STATUS = 1 in bits 12..16.
    driver.inject(RawCanFrame {
        id: 0x101,
        extended: false,
        len: 3,
        data: [0x32, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
    });
    // A frame the schema does not know about.
    driver.inject(RawCanFrame::standard(0x7AA, &[0xFF]).expect("valid frame"));

    let mut bus = CanBus::new(&mut driver, BaudRate::Kbps500);
    TelemetryBuilder::new(MemoryReader::new(CONFIG))
        .build(&mut bus)
        .expect("config should compile");

    let hits = Rc::new(Cell::new(0usize));
    let seen_psi = Rc::new(Cell::new(0.0f64));
    let seen_status = Rc::new(Cell::new(0u8));
    {
        let hits = hits.clone();
        let seen_psi = seen_psi.clone();
        let seen_status = seen_status.clone();
        bus.register_callback(
            0x101,
            Box::new(move |message| {
                hits.set(hits.get() + 1);
                if let Some(psi) = message.value_of::<f64>("FRONT_PSI") {
                    seen_psi.set(psi);
                }
                if let Some(status) = message.value_of::<u8>("STATUS") {
                    seen_status.set(status);
                }
            }),
        );
    }

    bus.initialize().expect("initialization should succeed");

    // Both frames drain; the unknown id is dropped without a callback.
    assert_eq!(bus.update(), 2);
    assert_eq!(hits.get(), 1);
    assert_eq!(seen_psi.get(), 2.5);
    assert_eq!(seen_status.get(), 1);

    // The decoded values are equally visible outside the callback.
    let brakes = bus.message(0x101).expect("message 0x101");
    assert_eq!(brakes.value_of::<f64>("FRONT_PSI"), Some(2.5));
    assert_eq!(brakes.value_of::<u8>("STATUS"), Some(1));

    // The queue is empty now.
    assert_eq!(bus.update(), 0);
}
