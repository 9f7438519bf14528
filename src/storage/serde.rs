use rust_decimal::Decimal;
use std::rc::Rc;
use thiserror::Error;

use crate::datom::*;
use crate::storage::restricts::Restricts;

macro_rules! write_to_vec {
    ($first:expr $(, $rest:expr)*) => {{
        let size = $first.size() $(+ $rest.size())*;
        let mut buffer = Vec::with_capacity(size);
        $first.write(&mut buffer);
        $($rest.write(&mut buffer);)*
        buffer
    }};
}

pub mod index {
    use super::*;

    pub const TAG_EAVT: u8 = 0x00;
    pub const TAG_AEVT: u8 = 0x01;
    pub const TAG_AVET: u8 = 0x02;

    /// Key prefix of the index best suited for `restricts`.
    pub fn key(restricts: &Restricts) -> Vec<u8> {
        match restricts {
            Restricts {
                entity: Some(entity),
                attribute: Some(attribute),
                value: Some(value),
            } => write_to_vec!(&TAG_EAVT, entity, attribute, value),
            Restricts {
                entity: Some(entity),
                attribute: Some(attribute),
                value: None,
            } => write_to_vec!(&TAG_EAVT, entity, attribute),
            Restricts {
                entity: Some(entity),
                attribute: None,
                value: _,
            } => write_to_vec!(&TAG_EAVT, entity),
            Restricts {
                entity: None,
                attribute: Some(attribute),
                value: Some(value),
            } => write_to_vec!(&TAG_AVET, attribute, value),
            Restricts {
                entity: None,
                attribute: Some(attribute),
                value: None,
            } => write_to_vec!(&TAG_AEVT, attribute),
            _ => write_to_vec!(&TAG_EAVT),
        }
    }

    /// Returns lowest value following largest value with given prefix.
    ///
    /// In other words, computes upper bound for a prefix scan over list of keys
    /// sorted in lexicographical order.  This means that a prefix scan can be
    /// expressed as range scan over a right-open `[prefix, next_prefix(prefix))`
    /// range.
    ///
    /// For example, for prefix `foo` the function returns `fop`.
    ///
    /// Returns `None` if there is no value which can follow value with given
    /// prefix.  This happens when prefix consists entirely of `'\xff'` bytes (or is
    /// empty).
    pub fn next_prefix(prefix: &[u8]) -> Option<Vec<u8>> {
        let ffs = prefix
            .iter()
            .rev()
            .take_while(|&&byte| byte == u8::MAX)
            .count();
        let mut next = prefix[..(prefix.len() - ffs)].to_vec();
        let last = next.last_mut()?;
        *last += 1;
        Some(next)
    }
}

mod value {
    pub const TAG_U64: u8 = 0x00;
    pub const TAG_I64: u8 = 0x01;
    pub const TAG_STR: u8 = 0x02;
    pub const TAG_DECIMAL: u8 = 0x03;
    pub const TAG_REF: u8 = 0x04;
}

mod op {
    pub const TAG_ASSERT: u8 = 0x00;
    pub const TAG_RETRACT: u8 = 0x01;
}

pub mod datom {
    use super::*;

    pub mod serialize {
        use super::*;

        pub fn eavt(datom: &Datom) -> Vec<u8> {
            write_to_vec!(
                index::TAG_EAVT,
                datom.entity,
                datom.attribute,
                datom.value,
                !datom.tx, // Keep tx in descending order
                datom.op
            )
        }

        pub fn aevt(datom: &Datom) -> Vec<u8> {
            write_to_vec!(
                index::TAG_AEVT,
                datom.attribute,
                datom.entity,
                datom.value,
                !datom.tx, // Keep tx in descending order
                datom.op
            )
        }

        pub fn avet(datom: &Datom) -> Vec<u8> {
            write_to_vec!(
                index::TAG_AVET,
                datom.attribute,
                datom.value,
                datom.entity,
                !datom.tx, // Keep tx in descending order
                datom.op
            )
        }
    }

    pub fn deserialize(buffer: &[u8]) -> ReadResult<Datom> {
        let mut reader = Reader::new(buffer);
        let tag: u8 = reader.read()?;
        match tag {
            index::TAG_EAVT => deserialize::eavt(&mut reader),
            index::TAG_AEVT => deserialize::aevt(&mut reader),
            index::TAG_AVET => deserialize::avet(&mut reader),
            _ => Err(ReadError::InvalidInput),
        }
    }

    mod deserialize {
        use super::*;

        pub fn eavt(reader: &mut Reader) -> ReadResult<Datom> {
            let entity = reader.read()?;
            let attribute = reader.read()?;
            let value = reader.read()?;
            let tx: u64 = reader.read()?;
            let tx = !tx;
            let op = reader.read()?;
            Ok(Datom {
                entity,
                attribute,
                value,
                tx,
                op,
            })
        }

        pub fn aevt(reader: &mut Reader) -> ReadResult<Datom> {
            let attribute = reader.read()?;
            let entity = reader.read()?;
            let value = reader.read()?;
            let tx: u64 = reader.read()?;
            let tx = !tx;
            let op = reader.read()?;
            Ok(Datom {
                entity,
                attribute,
                value,
                tx,
                op,
            })
        }

        pub fn avet(reader: &mut Reader) -> ReadResult<Datom> {
            let attribute = reader.read()?;
            let value = reader.read()?;
            let entity = reader.read()?;
            let tx: u64 = reader.read()?;
            let tx = !tx;
            let op = reader.read()?;
            Ok(Datom {
                entity,
                attribute,
                value,
                tx,
                op,
            })
        }
    }
}

/// Longest string the index encoding can hold.
pub const MAX_STR_LEN: usize = u16::MAX as usize;

// -------------------------------------------------------------------------------------------------

pub trait Writable {
    fn size(&self) -> usize;
    fn write(&self, buffer: &mut Vec<u8>);
}

impl<T: Writable + ?Sized> Writable for &T {
    fn size(&self) -> usize {
        (**self).size()
    }

    fn write(&self, buffer: &mut Vec<u8>) {
        (**self).write(buffer)
    }
}

impl Writable for u8 {
    fn size(&self) -> usize {
        1
    }

    fn write(&self, buffer: &mut Vec<u8>) {
        buffer.push(*self);
    }
}

// Fixed width integers are written big endian so that unsigned keys sort numerically.
macro_rules! big_endian {
    ($($int:ty),*) => {$(
        impl Writable for $int {
            fn size(&self) -> usize {
                std::mem::size_of::<$int>()
            }

            fn write(&self, buffer: &mut Vec<u8>) {
                buffer.extend_from_slice(&self.to_be_bytes());
            }
        }

        impl<'a> Readable<$int> for Reader<'a> {
            fn read(&mut self) -> ReadResult<$int> {
                Ok(<$int>::from_be_bytes(self.read_array()?))
            }
        }
    )*};
}

big_endian!(u16, u64, i64);

impl Writable for Decimal {
    fn size(&self) -> usize {
        16
    }

    fn write(&self, buffer: &mut Vec<u8>) {
        buffer.extend_from_slice(&self.serialize());
    }
}

// Strings longer than `MAX_STR_LEN` are rejected by the transactor before reaching here.
impl Writable for Rc<str> {
    fn size(&self) -> usize {
        std::mem::size_of::<u16>() + // Length
        self.len().min(MAX_STR_LEN)
    }

    fn write(&self, buffer: &mut Vec<u8>) {
        debug_assert!(
            self.len() <= MAX_STR_LEN,
            "string of {} bytes exceeds index key limit",
            self.len()
        );
        let length = u16::try_from(self.len()).unwrap_or(u16::MAX);
        length.write(buffer);
        buffer.extend_from_slice(&self.as_bytes()[..usize::from(length)]);
    }
}

impl Value {
    fn tag(&self) -> u8 {
        match self {
            Self::U64(_) => value::TAG_U64,
            Self::I64(_) => value::TAG_I64,
            Self::Str(_) => value::TAG_STR,
            Self::Decimal(_) => value::TAG_DECIMAL,
            Self::Ref(_) => value::TAG_REF,
        }
    }

    fn payload(&self) -> &dyn Writable {
        match self {
            Self::U64(value) | Self::Ref(value) => value,
            Self::I64(value) => value,
            Self::Str(value) => value,
            Self::Decimal(value) => value,
        }
    }
}

impl Writable for Value {
    fn size(&self) -> usize {
        1 + self.payload().size()
    }

    fn write(&self, buffer: &mut Vec<u8>) {
        self.tag().write(buffer);
        self.payload().write(buffer);
    }
}

impl Writable for Op {
    fn size(&self) -> usize {
        1
    }

    fn write(&self, buffer: &mut Vec<u8>) {
        match self {
            Self::Assert => op::TAG_ASSERT,
            Self::Retract => op::TAG_RETRACT,
        }
        .write(buffer)
    }
}

// -------------------------------------------------------------------------------------------------

pub struct Reader<'a> {
    buffer: &'a [u8],
    index: usize,
}

type ReadResult<T> = Result<T, ReadError>;

impl<'a> Reader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, index: 0 }
    }

    fn read_next(&mut self, num_bytes: usize) -> ReadResult<&[u8]> {
        if self.index + num_bytes > self.buffer.len() {
            return Err(ReadError::EndOfInput);
        }
        let from = self.index;
        self.index += num_bytes;
        Ok(&self.buffer[from..self.index])
    }

    fn read_array<const N: usize>(&mut self) -> ReadResult<[u8; N]> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.read_next(N)?);
        Ok(array)
    }
}

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("end of input")]
    EndOfInput,
    #[error("invalid input")]
    InvalidInput,
    #[error("utf8 error")]
    Utf8Error(#[from] std::str::Utf8Error),
}

// -------------------------------------------------------------------------------------------------

trait Readable<T> {
    fn read(&mut self) -> ReadResult<T>;
}

impl<'a> Readable<u8> for Reader<'a> {
    fn read(&mut self) -> ReadResult<u8> {
        let [byte] = self.read_array::<1>()?;
        Ok(byte)
    }
}

impl<'a> Readable<Decimal> for Reader<'a> {
    fn read(&mut self) -> ReadResult<Decimal> {
        Ok(Decimal::deserialize(self.read_array()?))
    }
}

impl<'a> Readable<Rc<str>> for Reader<'a> {
    fn read(&mut self) -> ReadResult<Rc<str>> {
        let length: u16 = self.read()?;
        let buffer = self.read_next(length.into())?;
        let str = std::str::from_utf8(buffer)?;
        Ok(Rc::from(str))
    }
}

impl<'a> Readable<Value> for Reader<'a> {
    fn read(&mut self) -> ReadResult<Value> {
        let tag: u8 = self.read()?;
        match tag {
            value::TAG_U64 => Ok(Value::U64(self.read()?)),
            value::TAG_I64 => Ok(Value::I64(self.read()?)),
            value::TAG_STR => Ok(Value::Str(self.read()?)),
            value::TAG_DECIMAL => Ok(Value::Decimal(self.read()?)),
            value::TAG_REF => Ok(Value::Ref(self.read()?)),
            _ => Err(ReadError::InvalidInput),
        }
    }
}

impl<'a> Readable<Op> for Reader<'a> {
    fn read(&mut self) -> ReadResult<Op> {
        let tag: u8 = self.read()?;
        match tag {
            op::TAG_ASSERT => Ok(Op::Assert),
            op::TAG_RETRACT => Ok(Op::Retract),
            _ => Err(ReadError::InvalidInput),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::index::*;
    use super::*;

    #[test]
    fn next_prefix_increments_last_byte() {
        assert_eq!(Some(b"fop".to_vec()), next_prefix(b"foo"));
    }

    #[test]
    fn next_prefix_skips_trailing_max_bytes() {
        assert_eq!(Some(vec![0x01]), next_prefix(&[0x00, 0xff, 0xff]));
        assert_eq!(None, next_prefix(&[0xff, 0xff]));
        assert_eq!(None, next_prefix(&[]));
    }

    #[test]
    fn key_uses_avet_for_attribute_and_value() {
        let restricts = Restricts::new()
            .with_attribute(20)
            .with_value(Value::Ref(101));
        let key = key(&restricts);
        assert_eq!(Some(&TAG_AVET), key.first());
    }

    #[test]
    fn newer_tx_sorts_first_within_same_fact() {
        let older = datom::serialize::eavt(&Datom::add(1, 2, 3u64, 10));
        let newer = datom::serialize::eavt(&Datom::retract(1, 2, 3u64, 11));
        assert!(newer < older);
    }

    #[test]
    fn write_as_many_bytes_as_sized() {
        for value in [Value::str(""), Value::str("Red"), Value::str(&"x".repeat(MAX_STR_LEN))] {
            let mut buffer = Vec::new();
            value.write(&mut buffer);
            assert_eq!(value.size(), buffer.len());
        }
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "exceeds index key limit")]
    fn refuse_strings_longer_than_length_prefix() {
        let value = Value::str(&"x".repeat(MAX_STR_LEN + 1));
        value.write(&mut Vec::new());
    }

    #[test]
    fn reject_unknown_value_tag() {
        let mut bytes = datom::serialize::eavt(&Datom::add(1, 2, 3u64, 4));
        bytes[17] = 0xee;
        assert!(matches!(
            datom::deserialize(&bytes),
            Err(ReadError::InvalidInput)
        ));
    }
}
