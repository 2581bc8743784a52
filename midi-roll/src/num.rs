use std::{
    fmt::{Debug, Display},
    ops::{AddAssign, SubAssign},
};

use num_traits::Num;

pub trait MIDINumInto<T: MIDINum> {
    /// Casts the midi time type to another supported type.
    ///
    /// By default, supports: u32, u64, f64
    /// ## Example
    /// ```
    ///use midi_roll::num::MIDINumInto;
    ///
    ///let ticks: u64 = 10;
    ///
    ///let beats: f64 = ticks.midi_num_into();
    ///let narrow: u32 = ticks.midi_num_into();
    ///
    ///assert_eq!(beats, 10f64);
    ///assert_eq!(narrow, 10u32);
    /// ```
    fn midi_num_into(&self) -> T;
}

pub trait MIDINumFrom<T: MIDINum> {
    /// Casts a supported type into the midi time type.
    fn midi_num_from(val: T) -> Self;
}

/// A number usable as a tick delta, either integer ticks or fractional time.
pub trait MIDINum:
    Num
    + PartialOrd
    + PartialEq
    + AddAssign
    + SubAssign
    + Copy
    + Sized
    + Debug
    + Display
    + Send
    + Sync
    + MIDINumFrom<u32>
    + MIDINumFrom<u64>
    + MIDINumFrom<f64>
    + MIDINumInto<u32>
    + MIDINumInto<u64>
    + MIDINumInto<f64>
{
}

macro_rules! impl_num_from_to {
    ($from:ident, $to:ident) => {
        impl MIDINumInto<$to> for $from {
            #[inline(always)]
            fn midi_num_into(&self) -> $to {
                *self as $to
            }
        }

        impl MIDINumFrom<$to> for $from {
            #[inline(always)]
            fn midi_num_from(val: $to) -> Self {
                val as $from
            }
        }
    };
}

macro_rules! impl_num_from {
    ($from:ident) => {
        impl_num_from_to!($from, u32);
        impl_num_from_to!($from, u64);
        impl_num_from_to!($from, f64);
    };
}

impl_num_from!(u32);
impl_num_from!(u64);
impl_num_from!(f64);

impl MIDINum for u32 {}
impl MIDINum for u64 {}
impl MIDINum for f64 {}
