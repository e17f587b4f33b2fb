use crate::{jwt::SessionData, schema::UserRole};

const USER_ACTIONS: &[ActionType] = &[
    ActionType::ManageOwnAccount,
    ActionType::ManageOwnFavorites,
    ActionType::ManageOwnShoppingCart,
    ActionType::ManageOwnSubscriptions,
    ActionType::CreateRecipes,
    ActionType::ManageOwnRecipes,
];

const ACTION_TABLE: &[(UserRole, &[ActionType])] = &[
    (UserRole::User, USER_ACTIONS),
    (
        UserRole::Staff,
        &[
            ActionType::ManageOwnAccount,
            ActionType::ManageOwnFavorites,
            ActionType::ManageOwnShoppingCart,
            ActionType::ManageOwnSubscriptions,
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageAllRecipes,
            ActionType::ManageTags,
            ActionType::ManageIngredients,
        ],
    ),
];

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ActionType {
    CreateRecipes,

    ManageOwnAccount,
    ManageOwnFavorites,
    ManageOwnShoppingCart,
    ManageOwnSubscriptions,
    ManageOwnRecipes,

    ManageAllRecipes,
    ManageTags,
    ManageIngredients,
}

impl ActionType {
    /// Inactive accounts are banned from every action.
    pub fn authenticate(self, session: &SessionData) -> bool {
        if !session.is_active {
            return false;
        }

        ACTION_TABLE
            .iter()
            .find(|(role, _)| *role == session.role)
            .is_some_and(|(_, actions)| actions.contains(&self))
    }
}
