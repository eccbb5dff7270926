//! Device info register read.

use crate::config::MonitorConfig;
use crate::device::{keys, Scope, StateError};
use crate::error::ActionError;
use crate::monitor::ActionSession;
use crate::value::Value;

use super::register::{RegisterRead, RegisterReadAction};

/// Address of the device info block.
pub const DEVICE_INFO_ADDRESS: u16 = 64050;

/// Length of the device info block in registers.
pub const DEVICE_INFO_REGISTERS: u16 = 6;

/// Reads the hardware info block of modems that report a radio signal.
///
/// The block is stored under `modem.deviceInfo` and the stage then rests for
/// `info_refresh_secs`.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    refresh_secs: u64,
}

impl DeviceInfo {
    /// Device info read that rests its stage for `refresh_secs` after success.
    #[must_use]
    pub const fn new(refresh_secs: u64) -> Self {
        Self { refresh_secs }
    }

    /// Build the ready-to-run action.
    #[must_use]
    pub fn action(config: &MonitorConfig) -> RegisterReadAction<Self> {
        RegisterReadAction::new(Self::new(config.info_refresh_secs), config)
    }
}

impl RegisterRead for DeviceInfo {
    fn name(&self) -> &str {
        "device-info"
    }

    fn address(&self) -> u16 {
        DEVICE_INFO_ADDRESS
    }

    fn count(&self) -> u16 {
        DEVICE_INFO_REGISTERS
    }

    fn enabled(&self, session: &ActionSession<'_>) -> Result<bool, StateError> {
        session.device_flag(keys::SIGNAL)
    }

    fn handle(&self, session: &mut ActionSession<'_>, registers: Vec<u16>) -> Result<(), ActionError> {
        session
            .device()
            .store()
            .set(Scope::Device, keys::DEVICE_INFO, Value::Registers(registers))?;
        session.sleep_stage(self.refresh_secs, true)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::actions::ReadRegisters;
    use crate::catalog::FixtureCatalog;
    use crate::device::{Device, DeviceId};
    use crate::logging::RecordingLogger;
    use crate::monitor::{MonitorContext, MonitorExecutor, Outcome, RecordingPacer};
    use crate::time::ManualClock;
    use crate::transport::MemoryTransport;

    struct Bench {
        transport: MemoryTransport,
        catalog: FixtureCatalog,
        device: Device,
        logger: RecordingLogger,
        executor: MonitorExecutor,
    }

    impl Bench {
        fn new(signal: bool) -> Self {
            let device = Device::new(DeviceId(0), "127.0.0.1", 5000, Vec::new(), 2);
            device
                .store()
                .set(Scope::Device, keys::SIGNAL, Value::Bool(signal))
                .unwrap();
            Self {
                transport: MemoryTransport::new(),
                catalog: FixtureCatalog::new(),
                device,
                logger: RecordingLogger::new(),
                executor: MonitorExecutor::with_parts(
                    Arc::new(ManualClock::default()),
                    Arc::new(RecordingPacer::new()),
                ),
            }
        }

        fn run(&self, action: &RegisterReadAction<DeviceInfo>) -> Outcome {
            let ctx = MonitorContext::new(&self.transport, &self.catalog, &self.device, &self.logger);
            self.executor.invoke(action, &ctx)
        }
    }

    fn response(transaction: u16, registers: &[u16]) -> Vec<u8> {
        let count = u8::try_from(registers.len() * 2).unwrap();
        let mut out = Vec::new();
        out.extend_from_slice(&transaction.to_be_bytes());
        out.extend_from_slice(&[0, 0, 0, 3 + count, 1, 0x03, count]);
        for r in registers {
            out.extend_from_slice(&r.to_be_bytes());
        }
        out
    }

    #[test]
    fn test_gated_off_without_signal() {
        let bench = Bench::new(false);
        let action = DeviceInfo::action(&MonitorConfig::default());

        assert_eq!(bench.run(&action), Outcome::Completed { success: false });
        assert_eq!(bench.transport.io_count(), 0);
    }

    #[test]
    fn test_reads_info_block() {
        let bench = Bench::new(true);
        bench.transport.push_response(response(1, &[1, 2, 3, 4, 5, 6]));
        let action = DeviceInfo::action(&MonitorConfig::default());

        assert_eq!(bench.run(&action), Outcome::Completed { success: true });

        let expected = ReadRegisters::new(1, 1, DEVICE_INFO_ADDRESS, DEVICE_INFO_REGISTERS)
            .unwrap()
            .encode();
        assert_eq!(bench.transport.writes(), vec![expected]);

        let store = bench.device.store();
        assert_eq!(
            store.get(Scope::Device, keys::DEVICE_INFO).unwrap(),
            Some(Value::Registers(vec![1, 2, 3, 4, 5, 6]))
        );
        assert!(store.get_flag(Scope::Stage, keys::SLEEPING).unwrap());
        assert_eq!(bench.transport.owner(), None);
    }

    #[test]
    fn test_read_failure_backs_off_device() {
        let bench = Bench::new(true);
        bench.transport.push_read_failure();
        let action = DeviceInfo::action(&MonitorConfig::default());

        assert_eq!(bench.run(&action), Outcome::Completed { success: false });
        assert!(bench.device.store().get_flag(Scope::Device, keys::SLEEPING).unwrap());
        assert_eq!(bench.logger.notices().len(), 1);
        assert!(bench.logger.notices()[0].ends_with("60 seconds"));
        // The lock stays with this device until its next successful read.
        assert_eq!(bench.transport.owner(), Some(DeviceId(0)));
    }

    #[test]
    fn test_write_failure_backs_off_device() {
        let bench = Bench::new(true);
        bench.transport.push_write_result(false);
        let action = DeviceInfo::action(&MonitorConfig::default());

        assert_eq!(bench.run(&action), Outcome::Completed { success: false });
        assert_eq!(bench.transport.lock_count(DeviceId(0)), 0);
        assert!(bench.device.store().get_flag(Scope::Device, keys::SLEEPING).unwrap());
    }

    #[test]
    fn test_exception_response_is_a_fault() {
        let bench = Bench::new(true);
        bench.transport.push_response(vec![0, 1, 0, 0, 0, 3, 1, 0x83, 0x02]);
        let action = DeviceInfo::action(&MonitorConfig::default());

        assert_eq!(bench.run(&action), Outcome::Faulted);
        assert_eq!(bench.logger.exceptions().len(), 1);
        assert!(bench.logger.exceptions()[0].contains("exception code"));
    }

    #[test]
    fn test_transaction_ids_advance() {
        let bench = Bench::new(true);
        bench.transport.push_write_result(false);
        bench.transport.push_write_result(false);
        let action = DeviceInfo::action(&MonitorConfig::default());

        let _ = bench.run(&action);
        bench.device.store().set(Scope::Device, keys::WAIT_TIME, Value::Null).unwrap();
        let _ = bench.run(&action);

        let writes = bench.transport.writes();
        assert_eq!(&writes[0][..2], &[0, 1]);
        assert_eq!(&writes[1][..2], &[0, 2]);
    }
}
