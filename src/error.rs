//! Error type shared by every fallible driver operation.

/// Errors reported by the driver. `E` is the error type of the bus interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The bus transport failed (NACK, timeout, pin error...).
    Interface(E),
    /// A command parameter was outside the range the controller accepts.
    InvalidArgument,
}
