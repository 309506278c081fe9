// Catalog content used across tests
pub const SONG_1_ID: &str = "SOUPIRU12A6D4FA1E1";
pub const SONG_1_TITLE: &str = "Der Kleine Dompfaff";
pub const SONG_1_DURATION: f64 = 152.92036;

pub const SONG_2_ID: &str = "SOZCTXZ12AB0182364";
pub const SONG_2_TITLE: &str = "Setanta matins";
pub const SONG_2_DURATION: f64 = 269.58322;

pub const ARTIST_1_ID: &str = "ARJIE2Y1187B994AB7";
pub const ARTIST_1_NAME: &str = "Line Renaud";

pub const ARTIST_2_ID: &str = "ARKRRTF1187B9984DA";
pub const ARTIST_2_NAME: &str = "Sonora Santanera";

// Session log content
pub const USER_1_ID: &str = "15";
pub const USER_2_ID: &str = "26";

// 2018-11-15T00:30:26.796Z, a Thursday
pub const TS_1: i64 = 1542241826796;
pub const TS_2: i64 = 1542242481796;
pub const TS_3: i64 = 1542253449796;
