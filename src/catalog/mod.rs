//! Static catalog of supported games and their modes. Pure lookups; the
//! catalog never changes at runtime.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameDef {
    pub slug: &'static str,
    pub name: &'static str,
    pub modes: &'static [&'static str],
}

impl GameDef {
    /// Case-insensitive mode check.
    pub fn has_mode(&self, mode: &str) -> bool {
        self.modes.iter().any(|m| m.eq_ignore_ascii_case(mode))
    }

    pub fn modes_joined(&self) -> String {
        self.modes.join(", ")
    }
}

pub const SUPPORTED_GAMES: &[GameDef] = &[
    GameDef {
        slug: "valorant",
        name: "Valorant",
        modes: &["Competitive", "Unrated", "Spike Rush", "Deathmatch"],
    },
    GameDef {
        slug: "fortnite",
        name: "Fortnite",
        modes: &["Battle Royale", "Zero Build", "Creative", "Save the World"],
    },
    GameDef {
        slug: "brawlhalla",
        name: "Brawlhalla",
        modes: &["1v1", "2v2", "Ranked", "Experimental"],
    },
    GameDef {
        slug: "thefinals",
        name: "The Finals",
        modes: &["Quick Cash", "Bank It", "Tournament"],
    },
    GameDef {
        slug: "roblox",
        name: "Roblox",
        modes: &["Various", "Roleplay", "Simulator", "Obby"],
    },
    GameDef {
        slug: "minecraft",
        name: "Minecraft",
        modes: &["Survival", "Creative", "PvP", "Minigames"],
    },
    GameDef {
        slug: "marvelrivals",
        name: "Marvel Rivals",
        modes: &["Quick Match", "Competitive", "Custom"],
    },
    GameDef {
        slug: "rocketleague",
        name: "Rocket League",
        modes: &["3v3", "2v2", "1v1", "Hoops"],
    },
    GameDef {
        slug: "apexlegends",
        name: "Apex Legends",
        modes: &["Trios", "Duos", "Ranked", "Arenas"],
    },
    GameDef {
        slug: "callofduty",
        name: "Call of Duty",
        modes: &["Multiplayer", "Warzone", "Search & Destroy"],
    },
    GameDef {
        slug: "overwatch",
        name: "Overwatch",
        modes: &["Competitive", "Quick Play", "Arcade"],
    },
    GameDef {
        slug: "amongus",
        name: "Among Us",
        modes: &["Classic", "Hide and Seek", "Custom Rules", "Private Lobby"],
    },
];

pub fn find(slug: &str) -> Option<&'static GameDef> {
    SUPPORTED_GAMES
        .iter()
        .find(|g| g.slug.eq_ignore_ascii_case(slug))
}

/// Mode suggestions for a partially typed value (autocomplete).
pub fn matching_modes(slug: &str, partial: &str) -> Vec<&'static str> {
    let Some(game) = find(slug) else {
        return Vec::new();
    };
    let needle = partial.to_lowercase();
    game.modes
        .iter()
        .filter(|m| m.to_lowercase().contains(&needle))
        .copied()
        .collect()
}
