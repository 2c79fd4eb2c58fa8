//! Bus ownership for one or more devices.
//!
//! A multi-step protocol (select input, trigger, wait, read back) must hold
//! the bus for its whole duration. [`Bus::acquire`] hands out a guard that
//! stays valid for exactly that span.

use core::ops::DerefMut;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embedded_hal_async::i2c;

/// A bus that several devices may share behind one lock.
pub type SharedBus<M, I2C> = Mutex<M, I2C>;

/// Access to an I2C bus for the span of one protocol sequence.
#[allow(async_fn_in_trait)]
pub trait Bus {
    type I2c: i2c::I2c;
    type Guard<'a>: DerefMut<Target = Self::I2c>
    where
        Self: 'a;

    /// Waits for exclusive use of the bus.
    async fn acquire(&mut self) -> Self::Guard<'_>;
}

/// A bus owned by a single device.
pub struct Exclusive<I2C>(I2C);

impl<I2C: i2c::I2c> Exclusive<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self(i2c)
    }

    pub fn into_inner(self) -> I2C {
        self.0
    }
}

impl<I2C: i2c::I2c> Bus for Exclusive<I2C> {
    type I2c = I2C;
    type Guard<'a>
        = &'a mut I2C
    where
        Self: 'a;

    async fn acquire(&mut self) -> Self::Guard<'_> {
        &mut self.0
    }
}

/// One device's handle to a [`SharedBus`].
pub struct Shared<'a, M: RawMutex, I2C> {
    bus: &'a SharedBus<M, I2C>,
}

impl<'a, M: RawMutex, I2C: i2c::I2c> Shared<'a, M, I2C> {
    pub fn new(bus: &'a SharedBus<M, I2C>) -> Self {
        Self { bus }
    }
}

impl<'a, M: RawMutex, I2C: i2c::I2c> Bus for Shared<'a, M, I2C> {
    type I2c = I2C;
    type Guard<'g>
        = MutexGuard<'a, M, I2C>
    where
        Self: 'g;

    async fn acquire(&mut self) -> Self::Guard<'_> {
        self.bus.lock().await
    }
}
