//! Driver behaviour against the simulated controller

use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use qflash_core::flash::{EraseKind, FlashConfig, QspiFlash};
use qflash_core::os::{CompletionSignal, StdMutex, StdSignal};
use qflash_core::qspi::{opcodes, Lines};
use qflash_core::Error;
use qflash_sim::{leak_driver, SimChip, SimFaults, SimFlash, SimQspi, TraceEvent};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn quick_config() -> FlashConfig {
    FlashConfig {
        lock_timeout_ms: 50,
        command_timeout_ms: 50,
        erase_timeout_ms: 200,
        chip_erase_timeout_ms: 400,
        ..FlashConfig::default()
    }
}

fn ready_flash(chip: SimChip) -> (&'static SimQspi, &'static SimFlash) {
    let (sim, flash) = leak_driver(SimQspi::new(chip), quick_config());
    flash.identify().unwrap();
    flash.enter_quad_mode().unwrap();
    sim.clear_trace();
    (sim, flash)
}

#[test]
fn test_identify_winbond() {
    let (_, flash) = leak_driver(SimQspi::new(SimChip::w25q80()), quick_config());
    let id = flash.identify().unwrap();
    assert_eq!((id.manufacturer, id.memory_type, id.capacity), (0xEF, 0x40, 0x14));
    assert_eq!(flash.sector_size().unwrap(), 4096);
    assert_eq!(flash.sector_count().unwrap(), 256);
    assert_eq!(flash.manufacturer_name().unwrap(), "Winbond");
    assert_eq!(flash.part_name().unwrap(), Some("W25Q80DV"));
}

#[test]
fn test_not_identified() {
    let (sim, flash) = leak_driver(SimQspi::new(SimChip::w25q80()), quick_config());
    let mut buf = [0u8; 4];
    assert_eq!(flash.read(0, &mut buf), Err(Error::NotIdentified));
    assert_eq!(flash.write(0, &buf), Err(Error::NotIdentified));
    assert_eq!(flash.erase(0, EraseKind::Sector), Err(Error::NotIdentified));
    assert_eq!(flash.enter_quad_mode(), Err(Error::NotIdentified));
    assert_eq!(flash.sector_size(), Err(Error::NotIdentified));
    assert!(sim.trace().is_empty());
}

#[test]
fn test_unsupported_manufacturer() {
    let chip = SimChip {
        manufacturer: 0x20,
        ..SimChip::w25q80()
    };
    let (sim, flash) = leak_driver(SimQspi::new(chip), quick_config());
    assert_eq!(flash.identify(), Err(Error::UnsupportedManufacturer(0x20)));
    // failure leaves the bus aborted and the driver unidentified
    assert_eq!(sim.trace().last(), Some(&TraceEvent::Abort));
    assert_eq!(flash.identity(), Err(Error::NotIdentified));
}

#[test]
fn test_reidentify_forgets_quad_state() {
    let (_, flash) = ready_flash(SimChip::w25q80());
    assert!(flash.is_quad_enabled().unwrap());
    flash.identify().unwrap();
    assert!(!flash.is_quad_enabled().unwrap());
    // chip kept QE, so enabling again is only a status read
    flash.enter_quad_mode().unwrap();
    assert!(flash.is_quad_enabled().unwrap());
}

#[test]
fn test_write_split_at_page_boundary() {
    let (sim, flash) = ready_flash(SimChip::w25q80());
    let data: Vec<u8> = (0..300u32).map(|i| i as u8).collect();
    flash.write(0x1000, &data).unwrap();

    let programs: Vec<_> = sim
        .trace()
        .into_iter()
        .filter_map(|e| match e {
            TraceEvent::Command {
                instruction: opcodes::QPP,
                address,
                data_lines,
                data_len,
            } => Some((address, data_lines, data_len)),
            _ => None,
        })
        .collect();
    assert_eq!(
        programs,
        vec![
            (Some(0x1000), Lines::Quad, 256),
            (Some(0x1100), Lines::Quad, 44)
        ]
    );
    assert_eq!(sim.count_commands(opcodes::WREN), 2);
    assert_eq!(&sim.memory()[0x1000..0x1000 + 300], &data[..]);
}

#[test]
fn test_two_page_write_programs_two_pages() {
    let (sim, flash) = ready_flash(SimChip::w25q80());
    let data: Vec<u8> = (0..512u32).map(|i| (i * 7) as u8).collect();
    flash.write(0x1000, &data).unwrap();

    let programs: Vec<_> = sim
        .trace()
        .into_iter()
        .filter_map(|e| match e {
            TraceEvent::Command {
                instruction: opcodes::QPP,
                address,
                data_len,
                ..
            } => Some((address, data_len)),
            _ => None,
        })
        .collect();
    assert_eq!(programs, vec![(Some(0x1000), 256), (Some(0x1100), 256)]);
    assert_eq!(&sim.memory()[0x1000..0x1200], &data[..]);
}

#[test]
fn test_unaligned_write_stays_in_page() {
    let (sim, flash) = ready_flash(SimChip::w25q80());
    flash.write(0x20F0, &[0xA5; 32]).unwrap();
    let mem = sim.memory();
    assert!(mem[0x20F0..0x2110].iter().all(|&b| b == 0xA5));
    // nothing wrapped to the page start
    assert_eq!(mem[0x2000], 0xFF);
    assert_eq!(sim.count_commands(opcodes::QPP), 2);
}

#[test]
fn test_read_back_random_data() {
    let (_, flash) = ready_flash(SimChip::w25q16());
    let mut rng = StdRng::seed_from_u64(0xBABA);
    let mut data = vec![0u8; 3 * 4096 + 17];
    rng.fill(&mut data[..]);

    for sector in 0..4 {
        flash.erase(0x10000 + sector * 4096, EraseKind::Sector).unwrap();
    }
    flash.write(0x10000 + 5, &data).unwrap();

    let mut back = vec![0u8; data.len()];
    flash.read(0x10000 + 5, &mut back).unwrap();
    assert_eq!(back, data);
}

#[test]
fn test_quad_enable_idempotent() {
    let (sim, flash) = leak_driver(SimQspi::new(SimChip::w25q80()), quick_config());
    flash.identify().unwrap();
    flash.enter_quad_mode().unwrap();
    assert_eq!(sim.count_commands(opcodes::VOLATILE_SR_WREN), 1);
    assert_eq!(sim.count_commands(opcodes::WRSR2), 1);
    assert!(sim.quad_enabled());

    sim.clear_trace();
    flash.enter_quad_mode().unwrap();
    assert_eq!(sim.commands(), vec![opcodes::RDSR2]);
}

#[test]
fn test_quad_enable_macronix() {
    let (sim, flash) = leak_driver(SimQspi::new(SimChip::mx25l1606()), quick_config());
    flash.identify().unwrap();
    assert_eq!(flash.manufacturer_name().unwrap(), "Macronix");
    flash.enter_quad_mode().unwrap();
    assert!(sim.quad_enabled());
    assert_eq!(sim.count_commands(opcodes::WRSR), 1);
    assert_eq!(sim.count_commands(opcodes::WRSR2), 0);

    flash.erase(0, EraseKind::Sector).unwrap();
    flash.write(0x80, b"macronix").unwrap();
    let mut buf = [0u8; 8];
    flash.read(0x80, &mut buf).unwrap();
    assert_eq!(&buf, b"macronix");
}

#[test]
fn test_quad_read_refused_before_quad_enable() {
    let (sim, flash) = leak_driver(SimQspi::new(SimChip::w25q80()), quick_config());
    flash.identify().unwrap();
    let mut buf = [0u8; 4];
    assert_eq!(flash.read(0, &mut buf), Err(Error::Bus(qflash_core::BusError::Rejected)));
    assert_eq!(sim.trace().last(), Some(&TraceEvent::Abort));
}

#[test]
fn test_bounds_and_alignment() {
    let (sim, flash) = ready_flash(SimChip::w25q80());
    let size = 1 << 20;
    let mut buf = [0u8; 8];
    assert_eq!(flash.read(size - 4, &mut buf), Err(Error::AddressOutOfBounds));
    assert_eq!(flash.write(size, &[1]), Err(Error::AddressOutOfBounds));
    assert_eq!(flash.erase(0x1001, EraseKind::Sector), Err(Error::InvalidAlignment));
    assert_eq!(flash.erase(0x1000, EraseKind::Block64K), Err(Error::InvalidAlignment));
    assert_eq!(flash.erase(size, EraseKind::Sector), Err(Error::AddressOutOfBounds));
    assert_eq!(flash.read_sector(256, &mut buf), Err(Error::AddressOutOfBounds));
    // precondition failures never reach the bus
    assert!(sim.trace().is_empty());

    // empty transfers inside the chip are no-ops
    flash.read(size, &mut []).unwrap();
    flash.write(0, &[]).unwrap();
    assert!(sim.trace().is_empty());
}

#[test]
fn test_erase_sizes() {
    let (sim, flash) = ready_flash(SimChip::w25q80());
    sim.load(0, &vec![0u8; 0x20000]).unwrap();

    flash.erase(0x1000, EraseKind::Sector).unwrap();
    flash.erase(0x8000, EraseKind::Block32K).unwrap();
    flash.erase(0x10000, EraseKind::Block64K).unwrap();
    let mem = sim.memory();
    assert_eq!(mem[0x0FFF], 0x00);
    assert!(mem[0x1000..0x2000].iter().all(|&b| b == 0xFF));
    assert_eq!(mem[0x2000], 0x00);
    assert!(mem[0x8000..0x20000].iter().all(|&b| b == 0xFF));

    flash.erase_chip().unwrap();
    assert!(sim.memory().iter().all(|&b| b == 0xFF));
    assert_eq!(
        sim.commands(),
        vec![
            opcodes::WREN,
            opcodes::SE_20,
            opcodes::WREN,
            opcodes::BE_52,
            opcodes::WREN,
            opcodes::BE_D8,
            opcodes::WREN,
            opcodes::CE_C7
        ]
    );
}

/// Completion signal that remembers every timeout it was asked to wait for
#[derive(Default)]
struct RecordingSignal {
    inner: StdSignal,
    waits: Mutex<Vec<u32>>,
}

impl CompletionSignal for RecordingSignal {
    fn post(&self) {
        self.inner.post();
    }

    fn reset(&self) {
        self.inner.reset();
    }

    fn wait_for(&self, timeout_ms: u32) -> bool {
        self.waits.lock().unwrap().push(timeout_ms);
        self.inner.wait_for(timeout_ms)
    }
}

#[test]
fn test_erase_timeout_selection() {
    let sim: &'static SimQspi = Box::leak(Box::new(SimQspi::new(SimChip::w25q80())));
    let config = quick_config();
    let flash: &'static QspiFlash<'static, SimQspi, StdMutex, RecordingSignal> = Box::leak(
        Box::new(QspiFlash::new(sim, StdMutex::new(), RecordingSignal::default(), config)),
    );
    sim.attach_irq(flash).unwrap();
    flash.identify().unwrap();

    flash.signal().waits.lock().unwrap().clear();
    flash.erase(0, EraseKind::Sector).unwrap();
    flash.erase(0x10000, EraseKind::Block64K).unwrap();
    flash.erase_chip().unwrap();
    assert_eq!(
        *flash.signal().waits.lock().unwrap(),
        vec![
            config.erase_timeout_ms,
            config.erase_timeout_ms,
            config.chip_erase_timeout_ms
        ]
    );
}

#[test]
fn test_dropped_interrupt_times_out_then_recovers() {
    let (sim, flash) = ready_flash(SimChip::w25q80());
    sim.set_faults(SimFaults::DROP_IRQ);
    let mut buf = [0u8; 16];
    let start = Instant::now();
    assert_eq!(flash.read(0, &mut buf), Err(Error::CompletionTimeout));
    assert!(start.elapsed() >= Duration::from_millis(45));
    assert!(sim
        .trace()
        .contains(&TraceEvent::IrqDropped(qflash_sim::IrqKind::ReceiveComplete)));
    assert_eq!(sim.trace().last(), Some(&TraceEvent::Abort));

    sim.set_faults(SimFaults::empty());
    sim.load(0, b"recovered").unwrap();
    let mut buf = [0u8; 9];
    flash.read(0, &mut buf).unwrap();
    assert_eq!(&buf, b"recovered");
}

#[test]
fn test_stale_post_does_not_complete_next_wait() {
    let (sim, flash) = ready_flash(SimChip::w25q80());
    // interrupt arriving while idle
    flash.signal().post();
    sim.set_faults(SimFaults::DROP_IRQ);
    let mut buf = [0u8; 4];
    assert_eq!(flash.read(0, &mut buf), Err(Error::CompletionTimeout));
}

#[test]
fn test_never_ready_erase_times_out_then_recovers() {
    let (sim, flash) = ready_flash(SimChip::w25q80());
    sim.load(0x2000, &[0u8; 16]).unwrap();
    sim.set_faults(SimFaults::NEVER_READY);
    assert_eq!(flash.erase(0, EraseKind::Sector), Err(Error::CompletionTimeout));
    assert_eq!(sim.trace().last(), Some(&TraceEvent::Abort));

    sim.set_faults(SimFaults::empty());
    flash.erase(0x2000, EraseKind::Sector).unwrap();
    assert!(sim.memory()[0x2000..0x2010].iter().all(|&b| b == 0xFF));
}

#[test]
fn test_write_times_out_then_recovers() {
    let (sim, flash) = ready_flash(SimChip::w25q80());
    sim.set_faults(SimFaults::DROP_IRQ);
    assert_eq!(flash.write(0x1000, &[0x11; 16]), Err(Error::CompletionTimeout));
    assert_eq!(sim.trace().last(), Some(&TraceEvent::Abort));
    // one page attempted, the poll for it never completed
    assert_eq!(sim.count_commands(opcodes::QPP), 1);

    sim.set_faults(SimFaults::empty());
    flash.write(0x1100, b"after timeout").unwrap();
    let mut buf = [0u8; 13];
    flash.read(0x1100, &mut buf).unwrap();
    assert_eq!(&buf, b"after timeout");
}

#[test]
fn test_identify_times_out_then_recovers() {
    let (sim, flash) = leak_driver(SimQspi::new(SimChip::w25q80()), quick_config());
    sim.set_faults(SimFaults::DROP_IRQ);
    assert_eq!(flash.identify(), Err(Error::CompletionTimeout));
    assert_eq!(sim.trace().last(), Some(&TraceEvent::Abort));
    assert_eq!(flash.identity(), Err(Error::NotIdentified));

    sim.set_faults(SimFaults::empty());
    let id = flash.identify().unwrap();
    assert_eq!(id.manufacturer, 0xEF);
    assert_eq!(flash.identity(), Ok(id));
}

#[test]
fn test_macronix_quad_enable_times_out_then_recovers() {
    let (sim, flash) = leak_driver(SimQspi::new(SimChip::mx25l1606()), quick_config());
    flash.identify().unwrap();
    sim.set_faults(SimFaults::NEVER_READY);
    assert_eq!(flash.enter_quad_mode(), Err(Error::CompletionTimeout));
    assert_eq!(sim.trace().last(), Some(&TraceEvent::Abort));
    assert!(!flash.is_quad_enabled().unwrap());

    sim.set_faults(SimFaults::empty());
    flash.enter_quad_mode().unwrap();
    assert!(flash.is_quad_enabled().unwrap());
    assert!(sim.quad_enabled());
}

#[test]
fn test_write_stops_at_first_failed_page() {
    let (sim, flash) = ready_flash(SimChip::w25q80());
    sim.fail_program_after(1);
    let data = [0x3Cu8; 600];
    assert_eq!(
        flash.write(0x3000, &data),
        Err(Error::Bus(qflash_core::BusError::Timeout))
    );
    let mem = sim.memory();
    assert!(mem[0x3000..0x3100].iter().all(|&b| b == 0x3C));
    assert!(mem[0x3100..0x3258].iter().all(|&b| b == 0xFF));
    // third page never attempted
    assert_eq!(sim.count_commands(opcodes::QPP), 2);
}

#[test]
fn test_memory_mapped_excludes_commands() {
    let (sim, flash) = ready_flash(SimChip::w25q80());
    sim.load(0x4000, b"xip code").unwrap();
    flash.enter_memory_mapped().unwrap();
    assert!(flash.is_memory_mapped().unwrap());
    // second entry is a no-op
    flash.enter_memory_mapped().unwrap();
    assert_eq!(sim.trace().iter().filter(|e| matches!(e, TraceEvent::MemoryMapped { .. })).count(), 1);

    let mut buf = [0u8; 8];
    sim.mapped_read(0x4000, &mut buf).unwrap();
    assert_eq!(&buf, b"xip code");

    assert_eq!(flash.read(0, &mut buf), Err(Error::MemoryMapped));
    assert_eq!(flash.write(0, &buf), Err(Error::MemoryMapped));
    assert_eq!(flash.erase(0, EraseKind::Sector), Err(Error::MemoryMapped));
    assert_eq!(flash.identify(), Err(Error::MemoryMapped));
    // refused without disturbing the mapping
    assert!(sim.is_mapped());

    flash.exit_memory_mapped().unwrap();
    assert!(!sim.is_mapped());
    flash.read(0x4000, &mut buf).unwrap();
    assert_eq!(&buf, b"xip code");
}

#[test]
fn test_memory_mapped_unsupported_controller() {
    use qflash_core::bus::BusFeatures;
    let sim = SimQspi::new(SimChip::w25q80()).with_features(BusFeatures::QUAD | BusFeatures::DUAL);
    let (_, flash) = leak_driver(sim, quick_config());
    flash.identify().unwrap();
    assert_eq!(flash.enter_memory_mapped(), Err(Error::IoModeNotSupported));
    assert!(!flash.is_memory_mapped().unwrap());
}

#[test]
fn test_sector_helpers() {
    let (sim, flash) = ready_flash(SimChip::w25q80());
    sim.load(0x5000, &[0u8; 64]).unwrap();
    flash.write_sector(5, b"sector five").unwrap();
    let mut buf = [0u8; 16];
    flash.read_sector(5, &mut buf).unwrap();
    assert_eq!(&buf[..11], b"sector five");
    assert_eq!(&buf[11..], &[0xFF; 5]);

    let big = vec![0u8; 4097];
    assert_eq!(flash.write_sector(5, &big), Err(Error::AddressOutOfBounds));
}

#[test]
fn test_lock_timeout_while_busy() {
    let sim = SimQspi::new(SimChip::w25q80()).with_latency(Some(Duration::from_millis(150)));
    let config = FlashConfig {
        lock_timeout_ms: 20,
        command_timeout_ms: 1000,
        ..FlashConfig::default()
    };
    let (_, flash) = leak_driver(sim, config);
    flash.identify().unwrap();

    let reader = thread::spawn(move || flash.identify());
    thread::sleep(Duration::from_millis(40));
    assert_eq!(flash.identify(), Err(Error::LockTimeout));
    assert!(reader.join().unwrap().is_ok());
}

#[test]
fn test_concurrent_writers() {
    let sim = SimQspi::new(SimChip::w25q80()).with_latency(Some(Duration::from_millis(1)));
    let config = FlashConfig {
        lock_timeout_ms: 5_000,
        command_timeout_ms: 500,
        ..FlashConfig::default()
    };
    let (sim, flash) = leak_driver(sim, config);
    flash.identify().unwrap();
    flash.enter_quad_mode().unwrap();

    let workers: Vec<_> = (0..4u8)
        .map(|n| {
            thread::spawn(move || {
                let address = 0x8000 + u32::from(n) * 4096;
                let data = [n + 1; 300];
                flash.erase(address, EraseKind::Sector)?;
                flash.write(address, &data)?;
                let mut back = [0u8; 300];
                flash.read(address, &mut back)?;
                assert_eq!(back, data);
                Ok::<_, Error>(())
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap().unwrap();
    }

    let mem = sim.memory();
    for n in 0..4usize {
        let base = 0x8000 + n * 4096;
        assert!(mem[base..base + 300].iter().all(|&b| b == n as u8 + 1));
    }
}
