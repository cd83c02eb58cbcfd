use crate::{error::AccessError, jwt::SessionData};

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ActionType {
    ViewProfiles,
    CreateRecipes,

    ManageOwnRecipes,
    ManageOwnFavorites,
    ManageOwnShoppingCart,
    ManageOwnSubscriptions,
    ManageOwnAccount,
}

impl ActionType {
    /// Gate for user-scoped actions. Runs before any object lookup, so an
    /// anonymous caller always sees 401 rather than 404 or 403.
    pub fn authorize(self, session: Option<&SessionData>) -> Result<&SessionData, potion::Error> {
        match session {
            Some(session) => {
                log::trace!("{} authorized for {:?}", session.username, self);
                Ok(session)
            }
            None => {
                log::trace!("Anonymous caller rejected for {:?}", self);
                Err(AccessError::Unauthenticated.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> SessionData {
        SessionData {
            user_id: 3,
            username: String::from("anna"),
        }
    }

    #[test]
    fn anonymous_callers_need_to_authenticate() {
        for action in [
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnFavorites,
            ActionType::ManageOwnShoppingCart,
            ActionType::ManageOwnSubscriptions,
        ] {
            match action.authorize(None) {
                Ok(_) => panic!("{action:?} allowed without a session"),
                Err(e) => assert_eq!(e.code, 401),
            }
        }
    }

    #[test]
    fn sessions_pass_through() {
        let session = session();

        match ActionType::ManageOwnFavorites.authorize(Some(&session)) {
            Ok(authorized) => assert_eq!(authorized.user_id, 3),
            Err(e) => panic!("rejected: {:?}", e.info),
        }
    }
}
