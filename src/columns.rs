//! Column names as they appear in the raw contact exports.

pub const EMAIL: &str = "Email";
pub const TYPE: &str = "Type";
pub const NAME: &str = "Name";
pub const TITLE: &str = "Title";
pub const URL: &str = "URL";
pub const LINK: &str = "Link";
pub const MA_PATH: &str = "ma_path";
pub const MA_URL: &str = "MA URL";
pub const MA_REFERRER: &str = "MA Referrer";
pub const IP_ADDRESS: &str = "IP Address";
pub const CUID: &str = "cuid";
pub const DATE: &str = "Date";
pub const MESSAGE_ID: &str = "Message Id";

/// Columns every source must carry for the cleaning stages to run.
pub const REQUIRED: [&str; 11] = [
    TITLE,
    NAME,
    URL,
    LINK,
    MA_PATH,
    MA_URL,
    MA_REFERRER,
    IP_ADDRESS,
    CUID,
    DATE,
    MESSAGE_ID,
];

/// Export-only columns removed before the sink.
pub const DROPPED: [&str; 9] = [
    "Template Id",
    "List Id",
    "Form Id",
    "Campaign Id",
    "Campaign Name",
    "Scenario Id",
    URL,
    LINK,
    "Tag",
];

/// Display names mapped to database-safe identifiers.
pub const RENAMED: [(&str, &str); 4] = [
    (MA_URL, "MA_URL"),
    (MA_REFERRER, "MA_Referrer"),
    (MESSAGE_ID, "Message_Id"),
    (IP_ADDRESS, "IP_Address"),
];
