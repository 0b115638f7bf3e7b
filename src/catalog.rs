use std::fmt;

pub const FIRST_YEAR: u16 = 2009;
pub const LAST_YEAR: u16 = 2025;

const BASE_URL: &str = "https://d37ci6vzurychx.cloudfront.net/trip-data";
const STAGING_SUFFIX: &str = ".part";

/// One monthly dataset file, identified by (year, month).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Period {
    pub year: u16,
    pub month: u8,
}

impl Period {
    pub fn new(year: u16, month: u8) -> Self {
        Self { year, month }
    }

    pub fn filename(&self) -> String {
        format!("yellow_tripdata_{}-{:02}.parquet", self.year, self.month)
    }

    /// Write target while the download is in flight.
    pub fn staging_filename(&self) -> String {
        format!("{}{}", self.filename(), STAGING_SUFFIX)
    }

    pub fn url(&self) -> String {
        format!("{}/{}", BASE_URL, self.filename())
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// Every published month, oldest first. Cheap to clone and restart.
pub fn periods() -> impl Iterator<Item = Period> + Clone {
    (FIRST_YEAR..=LAST_YEAR)
        .flat_map(|year| (1..=12u8).map(move |month| Period::new(year, month)))
}
