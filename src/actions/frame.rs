//! Register read framing.
//!
//! Requests are "read holding registers" (function 0x03) behind a 7-byte
//! header: transaction id, protocol id (always 0), remaining length, unit id.

use thiserror::Error;

/// Function code for reading holding registers.
pub const READ_HOLDING_REGISTERS: u8 = 0x03;

/// Bit set on the function code of an exception response.
const EXCEPTION_FLAG: u8 = 0x80;

/// Header plus function code.
const HEADER_LEN: usize = 8;

/// Largest register count a single read may request.
pub const MAX_READ_COUNT: u16 = 125;

/// Errors raised while building or decoding frames.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// Register count outside the allowed range.
    #[error("Register count {0} outside 1..=125")]
    InvalidCount(u16),

    /// Fewer bytes than the frame needs.
    #[error("Frame too short: expected {expected} bytes, got {actual}")]
    TooShort {
        expected: usize,
        actual: usize,
    },

    /// Response belongs to another request.
    #[error("Transaction mismatch: sent {expected}, received {actual}")]
    TransactionMismatch {
        expected: u16,
        actual: u16,
    },

    /// Response carries another function code.
    #[error("Unexpected function code {actual:#04x} (expected {expected:#04x})")]
    UnexpectedFunction {
        expected: u8,
        actual: u8,
    },

    /// Modem answered with an exception response.
    #[error("Modem returned exception code {code:#04x}")]
    Exception {
        code: u8,
    },

    /// Declared byte count differs from the requested register count.
    #[error("Byte count mismatch: expected {expected}, got {actual}")]
    ByteCountMismatch {
        expected: usize,
        actual: usize,
    },
}

/// A read of `count` consecutive registers starting at `address`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRegisters {
    /// Transaction id echoed by the modem.
    pub transaction: u16,
    /// Unit identifier.
    pub unit: u8,
    /// First register address.
    pub address: u16,
    /// Number of registers.
    pub count: u16,
}

impl ReadRegisters {
    /// Checked request constructor.
    ///
    /// # Errors
    ///
    /// Returns `FrameError::InvalidCount` unless `1 <= count <= 125`.
    pub fn new(transaction: u16, unit: u8, address: u16, count: u16) -> Result<Self, FrameError> {
        if count == 0 || count > MAX_READ_COUNT {
            return Err(FrameError::InvalidCount(count));
        }
        Ok(Self {
            transaction,
            unit,
            address,
            count,
        })
    }

    /// Same request under another transaction id.
    #[must_use]
    pub const fn with_transaction(self, transaction: u16) -> Self {
        Self {
            transaction,
            ..self
        }
    }

    /// Request bytes.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(12);
        out.extend_from_slice(&self.transaction.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&6u16.to_be_bytes());
        out.push(self.unit);
        out.push(READ_HOLDING_REGISTERS);
        out.extend_from_slice(&self.address.to_be_bytes());
        out.extend_from_slice(&self.count.to_be_bytes());
        out
    }

    /// Length of a successful response.
    #[must_use]
    pub const fn response_len(&self) -> usize {
        HEADER_LEN + 1 + 2 * self.count as usize
    }

    /// Decode the register values of a response to this request.
    ///
    /// # Errors
    ///
    /// Fails on short frames, a foreign transaction id, exception responses,
    /// an unexpected function code, or a byte count that does not match the
    /// requested register count.
    pub fn decode_response(&self, frame: &[u8]) -> Result<Vec<u16>, FrameError> {
        if frame.len() < HEADER_LEN + 1 {
            return Err(FrameError::TooShort {
                expected: self.response_len(),
                actual: frame.len(),
            });
        }

        let transaction = u16::from_be_bytes([frame[0], frame[1]]);
        if transaction != self.transaction {
            return Err(FrameError::TransactionMismatch {
                expected: self.transaction,
                actual: transaction,
            });
        }

        let function = frame[7];
        if function == READ_HOLDING_REGISTERS | EXCEPTION_FLAG {
            return Err(FrameError::Exception { code: frame[8] });
        }
        if function != READ_HOLDING_REGISTERS {
            return Err(FrameError::UnexpectedFunction {
                expected: READ_HOLDING_REGISTERS,
                actual: function,
            });
        }

        let expected = 2 * self.count as usize;
        let byte_count = frame[8] as usize;
        if byte_count != expected {
            return Err(FrameError::ByteCountMismatch {
                expected,
                actual: byte_count,
            });
        }

        let data = &frame[HEADER_LEN + 1..];
        if data.len() < expected {
            return Err(FrameError::TooShort {
                expected: self.response_len(),
                actual: frame.len(),
            });
        }

        Ok(data[..expected]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device_info_read() -> ReadRegisters {
        ReadRegisters::new(1, 1, 64050, 2).unwrap()
    }

    #[test]
    fn test_encode_matches_reference_bytes() {
        let frame = device_info_read().encode();
        assert_eq!(frame, hex::decode("0001000000060103fa320002").unwrap());
    }

    #[test]
    fn test_response_len() {
        assert_eq!(device_info_read().response_len(), 13);
    }

    #[test]
    fn test_decode_registers() {
        let frame = hex::decode("00010000000701030412345678").unwrap();
        assert_eq!(device_info_read().decode_response(&frame).unwrap(), vec![0x1234, 0x5678]);
    }

    #[test]
    fn test_decode_exception_response() {
        let frame = hex::decode("000100000003018302").unwrap();
        assert_eq!(
            device_info_read().decode_response(&frame).unwrap_err(),
            FrameError::Exception { code: 0x02 }
        );
    }

    #[test]
    fn test_decode_foreign_transaction() {
        let frame = hex::decode("00090000000701030412345678").unwrap();
        assert!(matches!(
            device_info_read().decode_response(&frame).unwrap_err(),
            FrameError::TransactionMismatch { expected: 1, actual: 9 }
        ));
    }

    #[test]
    fn test_decode_byte_count_mismatch() {
        let frame = hex::decode("000100000005010302abcd").unwrap();
        assert!(matches!(
            device_info_read().decode_response(&frame).unwrap_err(),
            FrameError::ByteCountMismatch { expected: 4, actual: 2 }
        ));
    }

    #[test]
    fn test_decode_truncated_data() {
        let frame = hex::decode("000100000007010304123456").unwrap();
        assert!(matches!(
            device_info_read().decode_response(&frame).unwrap_err(),
            FrameError::TooShort { expected: 13, actual: 12 }
        ));
    }

    #[test]
    fn test_rejects_invalid_count() {
        assert_eq!(ReadRegisters::new(1, 1, 0, 0).unwrap_err(), FrameError::InvalidCount(0));
        assert_eq!(ReadRegisters::new(1, 1, 0, 126).unwrap_err(), FrameError::InvalidCount(126));
    }

    #[test]
    fn test_with_transaction_keeps_request() {
        let read = device_info_read().with_transaction(0x0102);
        assert_eq!(read.transaction, 0x0102);
        assert_eq!(read.address, 64050);
        assert_eq!(&read.encode()[..2], &[0x01, 0x02]);
    }
}
