//! Administrator rights the bot holds in the staff group

use bitflags::bitflags;

bitflags! {
    /// Subset of chat administrator rights relevant to relaying
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BotRights: u32 {
        /// Create, rename and close forum topics
        const MANAGE_TOPICS   = 1 << 0;
        /// Delete messages of other members
        const DELETE_MESSAGES = 1 << 1;
        /// Pin messages
        const PIN_MESSAGES    = 1 << 2;
        /// Restrict or ban members
        const RESTRICT_MEMBERS = 1 << 3;

        /// Rights the relay needs to run every command
        const REQUIRED = Self::MANAGE_TOPICS.bits()
            | Self::DELETE_MESSAGES.bits()
            | Self::PIN_MESSAGES.bits();
    }
}

impl BotRights {
    /// Rights from `REQUIRED` that are not held
    #[must_use]
    pub fn missing(&self) -> BotRights {
        BotRights::REQUIRED.difference(*self)
    }

    /// Human-readable names of the set flags, in declaration order
    pub fn names(&self) -> Vec<&'static str> {
        self.iter_names()
            .filter(|(_, flag)| *flag != BotRights::REQUIRED)
            .map(|(name, _)| name)
            .collect()
    }
}
