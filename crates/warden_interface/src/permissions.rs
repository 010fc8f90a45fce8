//! Permission bits and rank comparisons.

use serde::{Deserialize, Serialize};

/// Discord permission bit values used by the guard.
pub mod permission_bits {
    /// Kick members
    pub const KICK_MEMBERS: u64 = 1 << 1;
    /// Ban members
    pub const BAN_MEMBERS: u64 = 1 << 2;
    /// Administrator (implies every other bit)
    pub const ADMINISTRATOR: u64 = 1 << 3;
    /// View channel
    pub const VIEW_CHANNEL: u64 = 1 << 10;
    /// Send messages
    pub const SEND_MESSAGES: u64 = 1 << 11;
    /// Connect to voice
    pub const CONNECT: u64 = 1 << 20;
    /// Speak in voice
    pub const SPEAK: u64 = 1 << 21;
    /// Manage roles
    pub const MANAGE_ROLES: u64 = 1 << 28;
    /// Time out members
    pub const MODERATE_MEMBERS: u64 = 1 << 40;

    /// Bits denied to the quarantine role on every text and voice channel.
    pub const QUARANTINE_DENY: u64 = VIEW_CHANNEL | SEND_MESSAGES | CONNECT | SPEAK;
}

/// A platform capability a sanction depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum Capability {
    /// Assign and remove roles.
    #[display("manage_roles")]
    ManageRoles,
    /// Kick members.
    #[display("kick_members")]
    KickMembers,
    /// Ban members.
    #[display("ban_members")]
    BanMembers,
    /// Time out members.
    #[display("moderate_members")]
    ModerateMembers,
}

impl Capability {
    /// Permission bit backing this capability.
    pub fn bit(self) -> u64 {
        match self {
            Self::ManageRoles => permission_bits::MANAGE_ROLES,
            Self::KickMembers => permission_bits::KICK_MEMBERS,
            Self::BanMembers => permission_bits::BAN_MEMBERS,
            Self::ModerateMembers => permission_bits::MODERATE_MEMBERS,
        }
    }
}

/// Where an account sits in the guild: its highest role position and its
/// effective guild-level permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    /// Position of the highest role held (0 for `@everyone` only).
    pub rank: u16,
    /// OR of the permission bits of every role held.
    pub permissions: u64,
    /// Whether the account owns the guild.
    pub is_owner: bool,
}

impl Standing {
    /// Whether this account may use `capability`.
    pub fn has(&self, capability: Capability) -> bool {
        self.is_owner
            || self.permissions & permission_bits::ADMINISTRATOR != 0
            || self.permissions & capability.bit() != 0
    }

    /// Whether this account strictly outranks `other`.
    ///
    /// The owner outranks everyone and is outranked by no one.
    pub fn outranks(&self, other: &Standing) -> bool {
        if other.is_owner {
            return false;
        }
        self.is_owner || self.rank > other.rank
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standing(rank: u16, permissions: u64) -> Standing {
        Standing {
            rank,
            permissions,
            is_owner: false,
        }
    }

    #[test]
    fn test_administrator_implies_capabilities() {
        let admin = standing(5, permission_bits::ADMINISTRATOR);
        assert!(admin.has(Capability::BanMembers));
        assert!(admin.has(Capability::ManageRoles));
    }

    #[test]
    fn test_missing_capability() {
        let kicker = standing(5, permission_bits::KICK_MEMBERS);
        assert!(kicker.has(Capability::KickMembers));
        assert!(!kicker.has(Capability::BanMembers));
    }

    #[test]
    fn test_equal_rank_does_not_outrank() {
        assert!(!standing(3, 0).outranks(&standing(3, 0)));
        assert!(standing(4, 0).outranks(&standing(3, 0)));
    }

    #[test]
    fn test_owner_is_never_outranked() {
        let owner = Standing {
            rank: 0,
            permissions: 0,
            is_owner: true,
        };
        assert!(!standing(u16::MAX, 0).outranks(&owner));
        assert!(owner.outranks(&standing(u16::MAX, 0)));
    }
}
