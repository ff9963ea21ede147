#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    /// Gym owner; sees revenue
    Admin = 1,
    /// Front desk
    Staff = 2,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Staff),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_ids() {
        assert_eq!(Role::from_id(1), Some(Role::Admin));
        assert_eq!(Role::from_id(2), Some(Role::Staff));
        assert_eq!(Role::from_id(3), None);
    }
}
