use std::fmt;

pub const ENDPOINT_IN: u8 = 0x80;

/// A USB endpoint address. The direction bit (0x80) is part of the address,
/// address 0 is the control endpoint.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Endpoint(u8);

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "EP 0x{:02X} ({})",
            self.0,
            if self.is_bulk_in() {
                "Bulk In"
            } else if self.is_bulk_out() {
                "Bulk Out"
            } else if self.is_control() {
                "Control"
            } else {
                "?"
            }
        )
    }
}

impl From<Endpoint> for u8 {
    fn from(ep: Endpoint) -> u8 {
        ep.0
    }
}

impl Endpoint {
    pub const fn new(ep: u8) -> Self {
        Self(ep)
    }

    pub const fn bulk_out(ep: u8) -> Self {
        Self(ep & 0xF)
    }

    pub const fn bulk_in(ep: u8) -> Self {
        Self(ENDPOINT_IN | (ep & 0xF))
    }

    pub fn is_control(&self) -> bool {
        self.0 == 0
    }

    pub fn is_bulk_in(&self) -> bool {
        // bulk can not be 0
        self.0 & ENDPOINT_IN == ENDPOINT_IN && self.0 & 0x0F != 0
    }

    pub fn is_bulk_out(&self) -> bool {
        // bulk can not be 0
        self.0 & 0xF0 == 0 && self.0 & 0x0F != 0
    }
}
