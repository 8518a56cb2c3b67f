//! North American data centers and their worlds

/// One data center and the worlds it hosts
#[derive(Debug, Clone, Copy)]
pub struct DataCenter {
    pub name: &'static str,
    pub worlds: &'static [&'static str],
}

/// NA data centers, the set the dashboard offers
pub const DATA_CENTERS: &[DataCenter] = &[
    DataCenter {
        name: "Aether",
        worlds: &[
            "Adamantoise",
            "Cactuar",
            "Faerie",
            "Gilgamesh",
            "Jenova",
            "Midgardsormr",
            "Sargatanas",
            "Siren",
        ],
    },
    DataCenter {
        name: "Crystal",
        worlds: &[
            "Balmung", "Brynhildr", "Coeurl", "Diabolos", "Goblin", "Malboro", "Mateus", "Zalera",
        ],
    },
    DataCenter {
        name: "Primal",
        worlds: &[
            "Behemoth",
            "Excalibur",
            "Exodus",
            "Famfrit",
            "Hyperion",
            "Lamia",
            "Leviathan",
            "Ultros",
        ],
    },
    DataCenter {
        name: "Dynamis",
        worlds: &["Halicarnassus", "Maduin", "Marilith", "Seraph"],
    },
];

/// Worlds of one data center, by name
pub fn worlds_of(data_center: &str) -> Option<&'static [&'static str]> {
    DATA_CENTERS
        .iter()
        .find(|dc| dc.name == data_center)
        .map(|dc| dc.worlds)
}
