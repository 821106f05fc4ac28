use std::sync::Arc;

use tracing::{debug, info};

use crate::models::{
    Influencer, InfluencerChanges, InfluencerDraft, InfluencerPatch, NewInfluencer, Page,
};
use crate::repository::InfluencerRepository;
use crate::{CoreError, CoreResult};

const MAX_NAME_CHARS: usize = 255;
const MAX_EMAIL_CHARS: usize = 255;

fn validate_name(name: &str) -> CoreResult<String> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_CHARS {
        return Err(CoreError::validation(format!(
            "name must be between 1 and {} characters",
            MAX_NAME_CHARS
        )));
    }
    Ok(name.to_string())
}

/// Lower-cased address with exactly one `@` and a dotted domain
fn normalize_email(email: &str) -> CoreResult<String> {
    let email = email.trim().to_lowercase();
    if email.chars().count() > MAX_EMAIL_CHARS {
        return Err(CoreError::validation(format!(
            "email must be at most {} characters",
            MAX_EMAIL_CHARS
        )));
    }

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if !valid {
        return Err(CoreError::validation(format!("Invalid email address: {}", email)));
    }
    Ok(email)
}

#[derive(Clone)]
pub struct InfluencerService {
    influencers: Arc<dyn InfluencerRepository>,
}

impl InfluencerService {
    pub fn new(influencers: Arc<dyn InfluencerRepository>) -> Self {
        Self { influencers }
    }

    pub async fn create_influencer(&self, draft: InfluencerDraft) -> CoreResult<Influencer> {
        let new_influencer = NewInfluencer {
            name: validate_name(&draft.name)?,
            email: normalize_email(&draft.email)?,
        };

        if self
            .influencers
            .get_influencer_by_email(&new_influencer.email)
            .await?
            .is_some()
        {
            debug!("Rejecting duplicate email: {}", new_influencer.email);
            return Err(CoreError::Conflict(format!(
                "Influencer with email {} already exists",
                new_influencer.email
            )));
        }

        let influencer = self.influencers.create_influencer(&new_influencer).await?;
        info!("Influencer created: id={}, email={}", influencer.id, influencer.email);
        Ok(influencer)
    }

    pub async fn get_influencer(&self, id: i64) -> CoreResult<Influencer> {
        self.influencers
            .get_influencer(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Influencer", id))
    }

    pub async fn list_influencers(&self, page: Page) -> CoreResult<Vec<Influencer>> {
        self.influencers.list_influencers(page).await
    }

    pub async fn update_influencer(
        &self,
        id: i64,
        patch: InfluencerPatch,
    ) -> CoreResult<Influencer> {
        let changes = InfluencerChanges {
            name: patch.name.as_deref().map(validate_name).transpose()?,
            email: patch.email.as_deref().map(normalize_email).transpose()?,
        };

        let influencer = self
            .influencers
            .update_influencer(id, &changes)
            .await?
            .ok_or_else(|| CoreError::not_found("Influencer", id))?;
        info!("Influencer updated: id={}", influencer.id);
        Ok(influencer)
    }

    pub async fn delete_influencer(&self, id: i64) -> CoreResult<()> {
        if !self.influencers.delete_influencer(id).await? {
            return Err(CoreError::not_found("Influencer", id));
        }
        info!("Influencer deleted: id={}", id);
        Ok(())
    }
}
