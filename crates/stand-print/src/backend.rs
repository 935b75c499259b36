//! # Printer Backends
//!
//! The `printer_backend` setting is a free-form string. It is parsed once,
//! at dispatch time, into a closed [`Backend`] enum that the dispatcher
//! matches exhaustively.
//!
//! | Setting             | Backend                         |
//! |---------------------|---------------------------------|
//! | `""`, `test`        | `Test`                          |
//! | `/dev/usb/lp0`      | `Device("/dev/usb/lp0")`        |
//! | `cups:EPSON_TM`     | `CupsQueue("EPSON_TM")`         |
//! | `auto`              | `CupsDefault`                   |
//! | `usb`, `usb:04b8:0202` | `Usb(None)`, `Usb(Some(..))` |
//! | `winspool:POS-80`   | `WinSpool("POS-80")`            |
//! | anything else       | `Unknown(raw)`                  |

use std::fmt;
use std::path::PathBuf;

/// USB vendor/product pair, written as hex `VID:PID`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UsbId {
    pub vendor: u16,
    pub product: u16,
}

impl UsbId {
    fn parse(raw: &str) -> Option<Self> {
        let (vendor, product) = raw.split_once(':')?;
        Some(UsbId {
            vendor: parse_hex_u16(vendor)?,
            product: parse_hex_u16(product)?,
        })
    }
}

fn parse_hex_u16(raw: &str) -> Option<u16> {
    let raw = raw.trim();
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);
    if digits.is_empty() || digits.len() > 4 {
        return None;
    }
    u16::from_str_radix(digits, 16).ok()
}

/// Where a receipt goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// No device; the job is captured and logged.
    Test,
    /// Raw device file, written directly.
    Device(PathBuf),
    /// Named CUPS queue via `lp -d <queue> -o raw`.
    CupsQueue(String),
    /// Default CUPS queue via `lp -o raw`.
    CupsDefault,
    /// Direct USB, optionally pinned to one device.
    Usb(Option<UsbId>),
    /// Windows spooler queue.
    WinSpool(String),
    /// Nothing above matched.
    Unknown(String),
}

impl Backend {
    /// Parses a backend setting. Never fails: unrecognised input becomes
    /// [`Backend::Unknown`] and is reported when dispatched.
    ///
    /// ## Example
    /// ```rust
    /// use stand_print::Backend;
    ///
    /// assert_eq!(Backend::parse("cups:EPSON"), Backend::CupsQueue("EPSON".into()));
    /// assert_eq!(Backend::parse(""), Backend::Test);
    /// assert!(matches!(Backend::parse("lpt1"), Backend::Unknown(_)));
    /// ```
    pub fn parse(spec: &str) -> Backend {
        let spec = spec.trim();

        if spec.is_empty() || spec == "test" {
            return Backend::Test;
        }
        if spec == "auto" {
            return Backend::CupsDefault;
        }
        if spec == "usb" {
            return Backend::Usb(None);
        }
        if spec.starts_with("/dev/") {
            return Backend::Device(PathBuf::from(spec));
        }
        if let Some(queue) = spec.strip_prefix("cups:") {
            let queue = queue.trim();
            if !queue.is_empty() {
                return Backend::CupsQueue(queue.to_string());
            }
        }
        if let Some(ids) = spec.strip_prefix("usb:") {
            if let Some(id) = UsbId::parse(ids) {
                return Backend::Usb(Some(id));
            }
        }
        if let Some(name) = spec.strip_prefix("winspool:") {
            let name = name.trim();
            if !name.is_empty() {
                return Backend::WinSpool(name.to_string());
            }
        }

        Backend::Unknown(spec.to_string())
    }

    /// True for backends that go through an external spooler process.
    pub fn is_spooled(&self) -> bool {
        matches!(self, Backend::CupsQueue(_) | Backend::CupsDefault)
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Test => f.write_str("test"),
            Backend::Device(path) => write!(f, "{}", path.display()),
            Backend::CupsQueue(queue) => write!(f, "cups:{queue}"),
            Backend::CupsDefault => f.write_str("auto"),
            Backend::Usb(None) => f.write_str("usb"),
            Backend::Usb(Some(id)) => write!(f, "usb:{:04x}:{:04x}", id.vendor, id.product),
            Backend::WinSpool(name) => write!(f, "winspool:{name}"),
            Backend::Unknown(raw) => f.write_str(raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_forms() {
        assert_eq!(Backend::parse("test"), Backend::Test);
        assert_eq!(Backend::parse("  "), Backend::Test);
        assert_eq!(
            Backend::parse("/dev/usb/lp0"),
            Backend::Device(PathBuf::from("/dev/usb/lp0"))
        );
        assert_eq!(Backend::parse("cups: EPSON_TM "), Backend::CupsQueue("EPSON_TM".into()));
        assert_eq!(Backend::parse("auto"), Backend::CupsDefault);
        assert_eq!(Backend::parse("usb"), Backend::Usb(None));
        assert_eq!(
            Backend::parse("usb:04b8:0x0202"),
            Backend::Usb(Some(UsbId {
                vendor: 0x04b8,
                product: 0x0202
            }))
        );
        assert_eq!(Backend::parse("winspool:POS-80"), Backend::WinSpool("POS-80".into()));
    }

    #[test]
    fn test_malformed_forms_are_unknown() {
        for raw in ["cups:", "usb:zz:01", "usb:04b8", "usb:12345:1", "winspool:", "automatic", "lpt1", "dev/usb"] {
            assert_eq!(Backend::parse(raw), Backend::Unknown(raw.to_string()), "{raw}");
        }
    }

    #[test]
    fn test_display_is_canonical() {
        for raw in ["test", "/dev/usb/lp0", "cups:EPSON", "auto", "usb", "usb:04b8:0202", "winspool:POS-80"] {
            assert_eq!(Backend::parse(raw).to_string(), raw);
        }
        assert_eq!(Backend::parse("usb:4B8:202").to_string(), "usb:04b8:0202");
    }

    #[test]
    fn test_is_spooled() {
        assert!(Backend::parse("auto").is_spooled());
        assert!(Backend::parse("cups:X").is_spooled());
        assert!(!Backend::parse("/dev/usb/lp0").is_spooled());
        assert!(!Backend::Test.is_spooled());
    }
}
