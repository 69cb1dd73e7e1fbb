use std::collections::HashSet;

use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;
use validator::ValidateEmail;

use crate::{
    EngineError, NewUserCmd, ParticipantInput, ResultEngine, User, ValidationErrors, users,
};

use super::{Engine, normalize_required_text, with_tx};

const MOBILE_MAX_CHARS: usize = 15;

fn is_valid_mobile_number(mobile: &str) -> bool {
    let digits = mobile.strip_prefix('+').unwrap_or(mobile);
    !digits.is_empty()
        && mobile.chars().count() <= MOBILE_MAX_CHARS
        && digits.chars().all(|c| c.is_ascii_digit())
}

/// Checks a user registration, returning the normalized user or every
/// problem found.
fn validate_new_user(cmd: &NewUserCmd) -> Result<User, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let email = cmd.email.trim().to_lowercase();
    if email.is_empty() {
        errors.add("email", "This field may not be blank.");
    } else if !email.validate_email() {
        errors.add("email", "Enter a valid email address.");
    }

    let name = normalize_required_text(&cmd.name, "name", &mut errors);

    let mobile_number = cmd.mobile_number.trim().to_string();
    if !is_valid_mobile_number(&mobile_number) {
        errors.add(
            "mobile_number",
            format!("Enter a phone number of at most {MOBILE_MAX_CHARS} digits."),
        );
    }

    let name = name.unwrap_or_default();
    errors.into_result(User::new(email, name, mobile_number))
}

impl Engine {
    /// Registers a new user.
    ///
    /// The email is stored lower-cased and must be unique.
    pub async fn new_user(&self, cmd: NewUserCmd) -> ResultEngine<User> {
        let user = validate_new_user(&cmd)?;
        with_tx!(self, |db_tx| {
            let exists = users::Entity::find()
                .filter(users::Column::Email.eq(user.email.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(user.email));
            }

            users::ActiveModel::from(&user).insert(&db_tx).await?;
            tracing::info!(user_id = %user.id, "user registered");
            Ok(user)
        })
    }

    /// Return a user by id.
    pub async fn user(&self, user_id: Uuid) -> ResultEngine<User> {
        let model = users::Entity::find_by_id(user_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))?;
        User::try_from(model)
    }

    /// Return every user, ordered by name.
    pub async fn users(&self) -> ResultEngine<Vec<User>> {
        users::Entity::find()
            .order_by_asc(users::Column::Name)
            .order_by_asc(users::Column::Email)
            .all(&self.database)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    pub(super) async fn require_user<C>(&self, db: &C, user_id: Uuid) -> ResultEngine<()>
    where
        C: ConnectionTrait,
    {
        users::Entity::find_by_id(user_id.to_string())
            .one(db)
            .await?
            .map(|_| ())
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }

    /// Records an error under `shares[i].user` for every participant that is
    /// not a registered user.
    pub(super) async fn check_participants_exist<C>(
        &self,
        db: &C,
        participants: &[ParticipantInput],
        errors: &mut ValidationErrors,
    ) -> ResultEngine<()>
    where
        C: ConnectionTrait,
    {
        if participants.is_empty() {
            return Ok(());
        }

        let ids: Vec<String> = participants
            .iter()
            .map(|p| p.participant_id.to_string())
            .collect();
        let found: HashSet<String> = users::Entity::find()
            .filter(users::Column::Id.is_in(ids))
            .all(db)
            .await?
            .into_iter()
            .map(|model| model.id)
            .collect();

        for (index, participant) in participants.iter().enumerate() {
            let id = participant.participant_id;
            if !found.contains(&id.to_string()) {
                errors.add(format!("shares[{index}].user"), format!("user {id} not exists"));
            }
        }
        Ok(())
    }
}
