//! Byte-level transports between the driver and the controller.
//!
//! Both controllers distinguish command bytes from display RAM data. Over I2C this is a control
//! byte leading each transaction, over 4-wire SPI it is the level of the D/C pin.

pub trait DisplayInterface {
    /// Error reported by the underlying bus.
    type Error;

    /// Send a single command byte.
    fn send_command(&mut self, cmd: u8) -> Result<(), Self::Error>;

    /// Send a run of command bytes, such as a command followed by its arguments.
    fn send_commands(&mut self, cmds: &[u8]) -> Result<(), Self::Error> {
        for &cmd in cmds {
            self.send_command(cmd)?;
        }
        Ok(())
    }

    /// Send display RAM data.
    fn send_data(&mut self, buf: &[u8]) -> Result<(), Self::Error>;
}

pub mod i2c {
    //! The I2C interface prefixes every transaction with a control byte: `0x00` when the
    //! remaining bytes are commands, `0x40` when they are display RAM data.

    use embedded_hal as hal;

    use super::DisplayInterface;

    /// Default 7-bit address of both controllers (SA0 pulled low).
    pub const DEFAULT_ADDRESS: u8 = 0x3C;

    const CONTROL_COMMAND: u8 = 0x00;
    const CONTROL_DATA: u8 = 0x40;

    /// Maximum payload per I2C transaction, not counting the control byte.
    const MAX_PAYLOAD: usize = 32;

    pub struct I2cInterface<I2C> {
        /// The I2C master the controller is attached to.
        i2c: I2C,
        /// 7-bit device address.
        address: u8,
    }

    impl<I2C> I2cInterface<I2C>
    where
        I2C: hal::blocking::i2c::Write,
    {
        /// Create a new I2C interface using the default device address.
        pub fn new(i2c: I2C) -> Self {
            Self::with_address(i2c, DEFAULT_ADDRESS)
        }

        /// Create a new I2C interface for a controller strapped to `address` (7-bit).
        pub fn with_address(i2c: I2C, address: u8) -> Self {
            Self { i2c, address }
        }

        /// Give back the I2C master.
        pub fn release(self) -> I2C {
            self.i2c
        }

        /// Send `bytes` behind `control`, splitting them over as many transactions as needed.
        fn write_tagged(&mut self, control: u8, bytes: &[u8]) -> Result<(), I2C::Error> {
            let mut buf = [0u8; MAX_PAYLOAD + 1];
            buf[0] = control;
            for chunk in bytes.chunks(MAX_PAYLOAD) {
                buf[1..=chunk.len()].copy_from_slice(chunk);
                self.i2c.write(self.address, &buf[..=chunk.len()])?;
            }
            Ok(())
        }
    }

    impl<I2C> DisplayInterface for I2cInterface<I2C>
    where
        I2C: hal::blocking::i2c::Write,
    {
        type Error = I2C::Error;

        fn send_command(&mut self, cmd: u8) -> Result<(), Self::Error> {
            self.i2c.write(self.address, &[CONTROL_COMMAND, cmd])
        }

        fn send_commands(&mut self, cmds: &[u8]) -> Result<(), Self::Error> {
            self.write_tagged(CONTROL_COMMAND, cmds)
        }

        fn send_data(&mut self, buf: &[u8]) -> Result<(), Self::Error> {
            self.write_tagged(CONTROL_DATA, buf)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use std::vec::Vec;

        #[derive(Default)]
        struct RecordingI2c {
            writes: Vec<(u8, Vec<u8>)>,
        }

        impl embedded_hal::blocking::i2c::Write for RecordingI2c {
            type Error = ();
            fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), ()> {
                self.writes.push((address, bytes.to_vec()));
                Ok(())
            }
        }

        #[test]
        fn command_is_tagged() {
            let mut di = I2cInterface::new(RecordingI2c::default());
            di.send_command(0xAF).unwrap();
            di.send_commands(&[0x81, 0x7F]).unwrap();
            let i2c = di.release();
            assert_eq!(
                i2c.writes,
                vec![(0x3C, vec![0x00, 0xAF]), (0x3C, vec![0x00, 0x81, 0x7F])]
            );
        }

        #[test]
        fn data_is_tagged_and_split() {
            let mut di = I2cInterface::with_address(RecordingI2c::default(), 0x3D);
            let data = (0..40).collect::<Vec<u8>>();
            di.send_data(&data).unwrap();
            let i2c = di.release();
            assert_eq!(i2c.writes.len(), 2);
            assert_eq!(i2c.writes[0].0, 0x3D);
            assert_eq!(i2c.writes[0].1[0], 0x40);
            assert_eq!(&i2c.writes[0].1[1..], &data[..32]);
            assert_eq!(i2c.writes[1].1[0], 0x40);
            assert_eq!(&i2c.writes[1].1[1..], &data[32..]);
        }
    }
}

pub mod spi {
    //! The SPI interface supports the "4-wire" interface of the controllers, such that each word
    //! on the SPI bus is 8 bits and the D/C GPIO selects between command and data.

    use embedded_hal as hal;
    use hal::digital::v2::OutputPin;

    use super::DisplayInterface;

    /// Failure of either the SPI bus or the D/C pin.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub enum SpiInterfaceError<SE, PE> {
        Spi(SE),
        Pin(PE),
    }

    pub struct SpiInterface<SPI, DC> {
        /// The SPI master device connected to the controller.
        spi: SPI,
        /// A GPIO output pin connected to the D/C (data/command) pin of the controller (the
        /// fourth "wire" of "4-wire" mode).
        dc: DC,
    }

    impl<SPI, DC> SpiInterface<SPI, DC>
    where
        SPI: hal::blocking::spi::Write<u8>,
        DC: OutputPin,
    {
        /// Create a new SPI interface to communicate with the display driver. `spi` is the SPI
        /// master device, and `dc` is the GPIO output pin connected to the D/C pin.
        pub fn new(spi: SPI, dc: DC) -> Self {
            Self { spi, dc }
        }

        /// Give back the SPI master and the D/C pin.
        pub fn release(self) -> (SPI, DC) {
            (self.spi, self.dc)
        }
    }

    impl<SPI, DC> DisplayInterface for SpiInterface<SPI, DC>
    where
        SPI: hal::blocking::spi::Write<u8>,
        DC: OutputPin,
    {
        type Error = SpiInterfaceError<SPI::Error, DC::Error>;

        fn send_command(&mut self, cmd: u8) -> Result<(), Self::Error> {
            self.send_commands(&[cmd])
        }

        fn send_commands(&mut self, cmds: &[u8]) -> Result<(), Self::Error> {
            self.dc.set_low().map_err(SpiInterfaceError::Pin)?;
            self.spi.write(cmds).map_err(SpiInterfaceError::Spi)
        }

        fn send_data(&mut self, buf: &[u8]) -> Result<(), Self::Error> {
            self.dc.set_high().map_err(SpiInterfaceError::Pin)?;
            self.spi.write(buf).map_err(SpiInterfaceError::Spi)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use std::cell::{Cell, RefCell};
        use std::rc::Rc;
        use std::vec::Vec;

        /// Records each SPI write together with the D/C level at the time.
        #[derive(Clone, Default)]
        struct Bus {
            dc: Rc<Cell<bool>>,
            writes: Rc<RefCell<Vec<(bool, Vec<u8>)>>>,
        }

        struct Pin(Bus);

        impl hal::blocking::spi::Write<u8> for Bus {
            type Error = ();
            fn write(&mut self, words: &[u8]) -> Result<(), ()> {
                self.writes.borrow_mut().push((self.dc.get(), words.to_vec()));
                Ok(())
            }
        }

        impl OutputPin for Pin {
            type Error = ();
            fn set_low(&mut self) -> Result<(), ()> {
                self.0.dc.set(false);
                Ok(())
            }
            fn set_high(&mut self) -> Result<(), ()> {
                self.0.dc.set(true);
                Ok(())
            }
        }

        #[test]
        fn dc_selects_command_or_data() {
            let bus = Bus::default();
            let mut di = SpiInterface::new(bus.clone(), Pin(bus.clone()));
            di.send_commands(&[0x21, 0x00, 0x7F]).unwrap();
            di.send_data(&[1, 2, 3]).unwrap();
            di.send_command(0xAF).unwrap();
            assert_eq!(
                *bus.writes.borrow(),
                vec![
                    (false, vec![0x21, 0x00, 0x7F]),
                    (true, vec![1, 2, 3]),
                    (false, vec![0xAF]),
                ]
            );
        }
    }
}

#[cfg(test)]
pub mod test_spy {
    //! An interface for use in unit tests to spy on whatever was sent to it. Clones obtained with
    //! `split` share the record, so a test can keep one half after moving the other into a
    //! `Display`.

    use super::DisplayInterface;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use std::vec::Vec;

    #[derive(Clone, Debug, PartialEq)]
    pub enum Sent {
        Cmd(u8),
        Data(Vec<u8>),
    }

    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct SpyError;

    pub struct TestSpyInterface {
        sent: Rc<RefCell<Vec<Sent>>>,
        /// Number of further transfers that succeed before every transfer fails. `None` never
        /// fails.
        fail_after: Rc<Cell<Option<usize>>>,
    }

    impl TestSpyInterface {
        pub fn new() -> Self {
            TestSpyInterface {
                sent: Rc::new(RefCell::new(Vec::new())),
                fail_after: Rc::new(Cell::new(None)),
            }
        }
        pub fn split(&self) -> Self {
            TestSpyInterface {
                sent: self.sent.clone(),
                fail_after: self.fail_after.clone(),
            }
        }
        pub fn check_multi(&self, expected: &[Sent]) {
            assert_eq!(*self.sent.borrow(), expected);
        }
        pub fn clear(&self) {
            self.sent.borrow_mut().clear()
        }
        pub fn sent(&self) -> Vec<Sent> {
            self.sent.borrow().clone()
        }
        /// All data bytes sent so far, concatenated in order.
        pub fn data(&self) -> Vec<u8> {
            self.sent
                .borrow()
                .iter()
                .filter_map(|s| match s {
                    Sent::Data(d) => Some(d.clone()),
                    Sent::Cmd(_) => None,
                })
                .flatten()
                .collect()
        }
        /// All command bytes sent so far, in order.
        pub fn commands(&self) -> Vec<u8> {
            self.sent
                .borrow()
                .iter()
                .filter_map(|s| match s {
                    Sent::Cmd(c) => Some(*c),
                    Sent::Data(_) => None,
                })
                .collect()
        }
        /// Make every transfer fail from now on.
        pub fn fail(&self) {
            self.fail_after.set(Some(0));
        }
        /// Let `n` more transfers succeed, then fail.
        pub fn fail_after(&self, n: usize) {
            self.fail_after.set(Some(n));
        }
        pub fn recover(&self) {
            self.fail_after.set(None);
        }

        fn transfer(&mut self, sent: Sent) -> Result<(), SpyError> {
            match self.fail_after.get() {
                Some(0) => Err(SpyError),
                Some(n) => {
                    self.fail_after.set(Some(n - 1));
                    self.sent.borrow_mut().push(sent);
                    Ok(())
                }
                None => {
                    self.sent.borrow_mut().push(sent);
                    Ok(())
                }
            }
        }
    }

    impl DisplayInterface for TestSpyInterface {
        type Error = SpyError;

        fn send_command(&mut self, cmd: u8) -> Result<(), SpyError> {
            self.transfer(Sent::Cmd(cmd))
        }
        fn send_data(&mut self, data: &[u8]) -> Result<(), SpyError> {
            self.transfer(Sent::Data(data.to_vec()))
        }
    }
}
