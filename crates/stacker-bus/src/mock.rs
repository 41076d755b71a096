//! Mock I2C 总线（无硬件依赖）
//!
//! 将一个 [`I2cSlave`] 挂到固定地址上，事务直接在调用线程内完成。
//! 支持脚本化故障注入与按事务记录时钟频率，供链路层降频/恢复
//! 滞回逻辑的测试使用。

use crate::{BusError, I2cMaster, I2cSlave};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::trace;

/// 进程内 mock 总线
pub struct MockBus {
    slave_addr: u8,
    slave: Arc<Mutex<dyn I2cSlave>>,
    clock_hz: u32,
    /// 注入的事务级故障，按 FIFO 消耗
    faults: VecDeque<BusError>,
    /// 下一次读事务截断到该长度（短读注入）
    truncate_next_read: Option<usize>,
    /// 每次事务尝试时的时钟频率
    clock_log: Vec<u32>,
}

impl MockBus {
    pub fn new(slave_addr: u8, slave: Arc<Mutex<dyn I2cSlave>>) -> Self {
        Self {
            slave_addr,
            slave,
            clock_hz: 400_000,
            faults: VecDeque::new(),
            truncate_next_read: None,
            clock_log: Vec::new(),
        }
    }

    /// 注入一次事务故障
    pub fn fail_next(&mut self, err: BusError) {
        self.faults.push_back(err);
    }

    /// 注入连续 `n` 次事务故障
    pub fn fail_next_n(&mut self, n: usize, err: BusError) {
        for _ in 0..n {
            self.faults.push_back(err.clone());
        }
    }

    /// 下一次读事务只返回 `len` 字节（模拟短读）
    pub fn truncate_next_read(&mut self, len: usize) {
        self.truncate_next_read = Some(len);
    }

    /// 各次事务尝试时的时钟频率记录
    pub fn clock_log(&self) -> &[u32] {
        &self.clock_log
    }

    fn begin_transaction(&mut self, addr: u8) -> Result<(), BusError> {
        self.clock_log.push(self.clock_hz);
        if let Some(err) = self.faults.pop_front() {
            trace!(?err, "mock bus injecting fault");
            return Err(err);
        }
        if addr != self.slave_addr {
            return Err(BusError::Nack { addr });
        }
        Ok(())
    }
}

impl I2cMaster for MockBus {
    fn probe(&mut self, addr: u8) -> Result<(), BusError> {
        self.begin_transaction(addr)
    }

    fn write(&mut self, addr: u8, bytes: &[u8]) -> Result<(), BusError> {
        self.begin_transaction(addr)?;
        self.slave.lock().on_receive(bytes);
        Ok(())
    }

    fn write_read(&mut self, addr: u8, reg: u8, buf: &mut [u8]) -> Result<usize, BusError> {
        self.begin_transaction(addr)?;
        let mut slave = self.slave.lock();
        slave.on_receive(&[reg]);
        let mut n = slave.on_request(buf);
        if let Some(limit) = self.truncate_next_read.take() {
            n = n.min(limit);
        }
        Ok(n)
    }

    fn set_clock(&mut self, hz: u32) {
        self.clock_hz = hz;
    }

    fn clock(&self) -> u32 {
        self.clock_hz
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 回显从机：记录收到的写入，读请求返回固定内容
    struct EchoSlave {
        received: Vec<Vec<u8>>,
    }

    impl I2cSlave for EchoSlave {
        fn on_receive(&mut self, bytes: &[u8]) {
            self.received.push(bytes.to_vec());
        }

        fn on_request(&mut self, buf: &mut [u8]) -> usize {
            for (i, b) in buf.iter_mut().enumerate() {
                *b = i as u8;
            }
            buf.len()
        }
    }

    fn rig() -> (MockBus, Arc<Mutex<EchoSlave>>) {
        let slave = Arc::new(Mutex::new(EchoSlave {
            received: Vec::new(),
        }));
        let bus = MockBus::new(0x12, slave.clone());
        (bus, slave)
    }

    #[test]
    fn write_routes_to_slave() {
        let (mut bus, slave) = rig();
        bus.write(0x12, &[0x00, 1, 2, 3]).unwrap();
        assert_eq!(slave.lock().received, vec![vec![0x00, 1, 2, 3]]);
    }

    #[test]
    fn wrong_address_nacks() {
        let (mut bus, _slave) = rig();
        assert_eq!(
            bus.write(0x13, &[0x00]).unwrap_err(),
            BusError::Nack { addr: 0x13 }
        );
    }

    #[test]
    fn faults_consumed_in_order() {
        let (mut bus, _slave) = rig();
        bus.fail_next(BusError::Timeout);
        assert_eq!(bus.probe(0x12).unwrap_err(), BusError::Timeout);
        bus.probe(0x12).unwrap();
    }

    #[test]
    fn clock_log_records_every_attempt() {
        let (mut bus, _slave) = rig();
        bus.set_clock(400_000);
        bus.fail_next(BusError::Timeout);
        let _ = bus.probe(0x12);
        bus.set_clock(100_000);
        bus.probe(0x12).unwrap();
        assert_eq!(bus.clock_log(), &[400_000, 100_000]);
    }

    #[test]
    fn short_read_injection() {
        let (mut bus, _slave) = rig();
        let mut buf = [0u8; 8];
        bus.truncate_next_read(3);
        let n = bus.write_read(0x12, 0x40, &mut buf).unwrap();
        assert_eq!(n, 3);
        // 截断只作用一次
        let n = bus.write_read(0x12, 0x40, &mut buf).unwrap();
        assert_eq!(n, 8);
    }
}
