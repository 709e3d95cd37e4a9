use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
    time::SystemTime,
};

use super::{Header, HeaderName, HeaderValue};
use crate::Error;

fn plain_value(name: HeaderName, value: String) -> HeaderValue {
    HeaderValue::dangerous_new_pre_encoded(name, value.clone(), value)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MimeVersion {
    pub major: u8,
    pub minor: u8,
}

pub const MIME_VERSION_1_0: MimeVersion = MimeVersion { major: 1, minor: 0 };

impl MimeVersion {
    pub fn new(major: u8, minor: u8) -> Self {
        MimeVersion { major, minor }
    }
}

impl Display for MimeVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl Default for MimeVersion {
    fn default() -> Self {
        MIME_VERSION_1_0
    }
}

impl Header for MimeVersion {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("MIME-Version")
    }

    fn display(&self) -> Result<HeaderValue, Error> {
        Ok(plain_value(Self::name(), self.to_string()))
    }
}

/// `Date` header, rendered as `Tue, 15 Nov 1994 08:12:31 GMT`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Date(pub SystemTime);

impl Date {
    pub fn now() -> Self {
        Date(SystemTime::now())
    }
}

impl From<SystemTime> for Date {
    fn from(time: SystemTime) -> Self {
        Date(time)
    }
}

impl Header for Date {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("Date")
    }

    fn display(&self) -> Result<HeaderValue, Error> {
        Ok(plain_value(Self::name(), httpdate::fmt_http_date(self.0)))
    }
}

/// Keyword valued headers, matched case insensitively when parsed
macro_rules! keyword_header {
    ($(#[$doc:meta])*($type_name: ident, $header_name: expr, {
        $($variant: ident => $keyword: expr),+ $(,)?
    })) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub enum $type_name {
            $($variant),+
        }

        impl $type_name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($type_name::$variant => $keyword),+
                }
            }
        }

        impl Display for $type_name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $type_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(
                    if s.trim().eq_ignore_ascii_case($keyword) {
                        return Ok($type_name::$variant);
                    }
                )+
                Err(s.into())
            }
        }

        impl Header for $type_name {
            fn name() -> HeaderName {
                HeaderName::new_from_ascii_str($header_name)
            }

            fn display(&self) -> Result<HeaderValue, Error> {
                Ok(plain_value(Self::name(), self.as_str().to_owned()))
            }
        }
    };
}

keyword_header! {
    /// `Importance` header (RFC 2156)
    (Importance, "Importance", {
        High => "high",
        Normal => "normal",
        Low => "low",
    })
}

keyword_header! {
    /// `Priority` header (RFC 2156)
    (Priority, "Priority", {
        Urgent => "urgent",
        Normal => "normal",
        NonUrgent => "non-urgent",
    })
}

keyword_header! {
    /// `Sensitivity` header (RFC 2156)
    (Sensitivity, "Sensitivity", {
        Personal => "Personal",
        Private => "Private",
        CompanyConfidential => "Company-Confidential",
    })
}
