//! In-memory mirrors of device registers.
//!
//! A [`CachedRegister`] is the only place a register's value is kept on the
//! host side. Field writes are read-modify-write against the mirror; the
//! mirror only advances once the bus write has succeeded.

use crate::field::{Bits, DecodeError, Field};
use crate::Error;
use core::marker::PhantomData;
use embedded_hal_async::i2c;

mod sealed {
    pub trait Sealed {}
}

/// Whether the hardware can echo a register back.
pub trait Access: sealed::Sealed {}

/// The register can be read back from the device.
pub enum ReadWrite {}

/// The device never echoes this register; the mirror is the only truth.
pub enum WriteOnly {}

impl sealed::Sealed for ReadWrite {}
impl sealed::Sealed for WriteOnly {}

impl Access for ReadWrite {}
impl Access for WriteOnly {}

/// Mirror of one register on one device.
pub struct CachedRegister<W: Bits, A: Access> {
    address: u8,
    value: W,
    transient: W,
    synced: bool,
    _access: PhantomData<A>,
}

impl<W: Bits, A: Access> CachedRegister<W, A> {
    /// Creates a mirror holding `initial`. Nothing is sent to the device.
    pub fn new(address: u8, initial: W) -> Self {
        Self::with_transient(address, initial, W::ZERO)
    }

    /// Like [`new`](Self::new), but `transient` bits (status or
    /// self-clearing bits) are never retained in the mirror.
    pub fn with_transient(address: u8, initial: W, transient: W) -> Self {
        Self {
            address,
            value: initial & !transient,
            transient,
            synced: false,
            _access: PhantomData,
        }
    }

    /// Register address on the device.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Current mirror contents.
    pub fn value(&self) -> W {
        self.value
    }

    /// Whether the mirror is known to match the device. False until the
    /// first successful transfer and after any failed write.
    pub fn is_synced(&self) -> bool {
        self.synced
    }

    /// Decodes a field from the mirror without touching the bus.
    pub fn field<F: Field<Raw = W>>(&self) -> Result<F, DecodeError> {
        F::decode(self.value)
    }

    /// Writes the whole mirror to the device.
    pub async fn sync<I2C: i2c::I2c>(
        &mut self,
        i2c: &mut I2C,
        device: u8,
    ) -> Result<(), Error<I2C::Error>> {
        let value = self.value;
        self.write_raw(i2c, device, value).await
    }

    /// Writes `value` to the device and, on success, makes it the mirror.
    /// On failure the mirror keeps its previous contents and is marked stale.
    pub async fn write_raw<I2C: i2c::I2c>(
        &mut self,
        i2c: &mut I2C,
        device: u8,
        value: W,
    ) -> Result<(), Error<I2C::Error>> {
        match self.transfer(i2c, device, value).await {
            Ok(()) => {
                self.value = value & !self.transient;
                self.synced = true;
                Ok(())
            }
            Err(e) => {
                self.synced = false;
                Err(e)
            }
        }
    }

    /// Read-modify-write of a single field.
    ///
    /// Returns the field as it now stands in the mirror.
    pub async fn write_field<I2C: i2c::I2c, F: Field<Raw = W>>(
        &mut self,
        i2c: &mut I2C,
        device: u8,
        value: F,
    ) -> Result<F, Error<I2C::Error>> {
        let raw = value.encode(self.value);
        self.write_raw(i2c, device, raw).await?;
        F::decode(self.value).map_err(Error::Decode)
    }

    /// Writes the mirror with `value` applied, without retaining `value`.
    ///
    /// Used for self-clearing bits such as "begin conversion".
    pub async fn pulse<I2C: i2c::I2c, F: Field<Raw = W>>(
        &mut self,
        i2c: &mut I2C,
        device: u8,
        value: F,
    ) -> Result<(), Error<I2C::Error>> {
        let raw = value.encode(self.value);
        match self.transfer(i2c, device, raw).await {
            Ok(()) => {
                self.synced = true;
                Ok(())
            }
            Err(e) => {
                self.synced = false;
                Err(e)
            }
        }
    }

    async fn transfer<I2C: i2c::I2c>(
        &self,
        i2c: &mut I2C,
        device: u8,
        value: W,
    ) -> Result<(), Error<I2C::Error>> {
        let mut buf = [0u8; 3];
        buf[0] = self.address;
        value.write_be(&mut buf[1..=W::BYTES]);
        let frame = &buf[..=W::BYTES];
        let bits: u16 = value.into();
        trace!(
            "write dev={:#x} reg={:#x} value={:#x}",
            device,
            self.address,
            bits
        );
        i2c.write(device, frame).await.map_err(|e| {
            warn!(
                "failed write to register {:#x} on device {:#x}",
                self.address,
                device
            );
            Error::I2c(e)
        })
    }
}

impl<W: Bits> CachedRegister<W, ReadWrite> {
    /// Reads the register from the device into the mirror and returns the
    /// raw value as read, transient bits included.
    pub async fn refresh<I2C: i2c::I2c>(
        &mut self,
        i2c: &mut I2C,
        device: u8,
    ) -> Result<W, Error<I2C::Error>> {
        let mut buf = [0u8; 2];
        let buf = &mut buf[..W::BYTES];
        i2c.write_read(device, &[self.address], buf)
            .await
            .map_err(|e| {
                warn!(
                    "failed read of register {:#x} on device {:#x}",
                    self.address,
                    device
                );
                Error::I2c(e)
            })?;
        let raw = W::read_be(buf);
        let bits: u16 = raw.into();
        trace!("read dev={:#x} reg={:#x} value={:#x}", device, self.address, bits);
        self.value = raw & !self.transient;
        self.synced = true;
        Ok(raw)
    }

    /// Reads the register from the device and decodes one field. The read
    /// refreshes the mirror for every field of the register.
    pub async fn read_field<I2C: i2c::I2c, F: Field<Raw = W>>(
        &mut self,
        i2c: &mut I2C,
        device: u8,
    ) -> Result<F, Error<I2C::Error>> {
        let raw = self.refresh(i2c, device).await?;
        F::decode(raw).map_err(Error::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_async::i2c::ErrorKind;
    use embedded_hal_mock::eh1::i2c::{Mock as MockI2c, Transaction as I2cTransaction};

    const DEVICE: u8 = 0x60;
    const CONFIG: u8 = 0x00;

    register_field! {
        enum Shutdown: u8 [0b1000_0000] {
            Normal = 0b0000_0000,
            Shutdown = 0b1000_0000,
        }
    }

    register_field! {
        enum MatrixMode: u8 [0b0001_1000] {
            Both = 0b0000_0000,
            One = 0b0000_1000,
            Two = 0b0001_0000,
        }
    }

    register_field! {
        enum Busy: u16 [0x8000] {
            Yes = 0x0000,
            No = 0x8000,
        }
    }

    register_field! {
        enum Rate: u16 [0x00E0] {
            Slow = 0x0000,
            Fast = 0x00E0,
        }
    }

    #[tokio::test]
    async fn write_only_field_updates_mirror() {
        let expectations = [
            I2cTransaction::write(DEVICE, vec![CONFIG, 0b0000_1000]),
            I2cTransaction::write(DEVICE, vec![CONFIG, 0b1000_1000]),
        ];
        let mut i2c = MockI2c::new(&expectations);
        let mut reg = CachedRegister::<u8, WriteOnly>::new(CONFIG, 0);

        assert!(!reg.is_synced());
        assert_eq!(
            reg.write_field(&mut i2c, DEVICE, MatrixMode::One).await,
            Ok(MatrixMode::One)
        );
        assert_eq!(
            reg.write_field(&mut i2c, DEVICE, Shutdown::Shutdown).await,
            Ok(Shutdown::Shutdown)
        );
        assert_eq!(reg.value(), 0b1000_1000);
        assert_eq!(reg.field::<MatrixMode>(), Ok(MatrixMode::One));
        assert!(reg.is_synced());

        i2c.done();
    }

    #[tokio::test]
    async fn failed_write_keeps_previous_mirror() {
        let expectations = [
            I2cTransaction::write(DEVICE, vec![CONFIG, 0b0001_0000]),
            I2cTransaction::write(DEVICE, vec![CONFIG, 0b1001_0000]).with_error(ErrorKind::Other),
        ];
        let mut i2c = MockI2c::new(&expectations);
        let mut reg = CachedRegister::<u8, WriteOnly>::new(CONFIG, 0);

        reg.write_field(&mut i2c, DEVICE, MatrixMode::Two)
            .await
            .unwrap();
        assert_eq!(
            reg.write_field(&mut i2c, DEVICE, Shutdown::Shutdown).await,
            Err(Error::I2c(ErrorKind::Other))
        );
        assert_eq!(reg.value(), 0b0001_0000);
        assert_eq!(reg.field::<Shutdown>(), Ok(Shutdown::Normal));
        assert!(!reg.is_synced());

        i2c.done();
    }

    #[tokio::test]
    async fn read_field_refreshes_whole_mirror() {
        let expectations = [
            I2cTransaction::write_read(DEVICE, vec![CONFIG], vec![0x80, 0xE0]),
            I2cTransaction::write(DEVICE, vec![CONFIG, 0x00, 0x00]),
        ];
        let mut i2c = MockI2c::new(&expectations);
        let mut reg = CachedRegister::<u16, ReadWrite>::with_transient(CONFIG, 0x0000, 0x8000);

        assert_eq!(reg.read_field::<_, Busy>(&mut i2c, DEVICE).await, Ok(Busy::No));
        // The fresh read carries Rate as well; the status bit is not kept.
        assert_eq!(reg.value(), 0x00E0);
        assert_eq!(reg.field::<Rate>(), Ok(Rate::Fast));

        assert_eq!(
            reg.write_field(&mut i2c, DEVICE, Rate::Slow).await,
            Ok(Rate::Slow)
        );

        i2c.done();
    }

    #[tokio::test]
    async fn pulse_is_not_retained() {
        let expectations = [
            I2cTransaction::write(DEVICE, vec![CONFIG, 0x80, 0xE0]),
            I2cTransaction::write(DEVICE, vec![CONFIG, 0x00, 0x00]),
        ];
        let mut i2c = MockI2c::new(&expectations);
        let mut reg = CachedRegister::<u16, ReadWrite>::with_transient(CONFIG, 0x00E0, 0x8000);

        reg.pulse(&mut i2c, DEVICE, Busy::No).await.unwrap();
        assert_eq!(reg.value(), 0x00E0);
        reg.write_raw(&mut i2c, DEVICE, 0x0000).await.unwrap();

        i2c.done();
    }

    #[tokio::test]
    async fn failed_read_leaves_mirror() {
        let expectations = [I2cTransaction::write_read(DEVICE, vec![CONFIG], vec![0x00, 0x00])
            .with_error(ErrorKind::Other)];
        let mut i2c = MockI2c::new(&expectations);
        let mut reg = CachedRegister::<u16, ReadWrite>::new(CONFIG, 0x00E0);

        assert_eq!(
            reg.read_field::<_, Rate>(&mut i2c, DEVICE).await,
            Err(Error::I2c(ErrorKind::Other))
        );
        assert_eq!(reg.value(), 0x00E0);

        i2c.done();
    }
}
