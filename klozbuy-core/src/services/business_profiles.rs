use super::require_user;
use crate::common::error::{KlozbuyError, Result};
use crate::common::pagination::Page;
use crate::domain::*;
use crate::jsonld;
use crate::storage::Storage;
use crate::validation::{clean, is_clock_time, Validator};
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

const NAME_MAX: usize = 120;
const CATEGORY_MAX: usize = 60;
const DESCRIPTION_MAX: usize = 2000;
const PHONE_MAX: usize = 20;

fn check_profile(v: &mut Validator, profile: &BusinessProfile) {
    v.length("businessName", &profile.business_name, 1, NAME_MAX)
        .length("category", &profile.category, 1, CATEGORY_MAX)
        .optional_length("description", profile.description.as_deref(), DESCRIPTION_MAX)
        .optional_http_url("website", profile.website.as_deref())
        .optional_length("phone", profile.phone.as_deref(), PHONE_MAX)
        .optional_email("email", profile.email.as_deref());
    for (i, hours) in profile.opening_hours.iter().enumerate() {
        let opens = format!("openingHours[{i}].opens");
        let closes = format!("openingHours[{i}].closes");
        v.clock_time(&opens, &hours.opens).clock_time(&closes, &hours.closes);
        // Zero-padded HH:MM compares correctly as text.
        if is_clock_time(&hours.opens) && is_clock_time(&hours.closes) {
            v.check(
                hours.opens < hours.closes,
                &closes,
                "must be later than opens",
            );
        }
    }
}

pub async fn create_profile(
    storage: &dyn Storage,
    input: NewBusinessProfile,
) -> Result<BusinessProfile> {
    let now = Utc::now();
    let profile = BusinessProfile {
        id: Uuid::new_v4(),
        user_id: input.user_id,
        business_name: input.business_name.trim().to_string(),
        category: input.category.trim().to_string(),
        description: clean(input.description),
        website: clean(input.website),
        phone: clean(input.phone),
        email: clean(input.email).map(|e| e.to_lowercase()),
        opening_hours: input.opening_hours,
        location_id: input.location_id,
        verified: false,
        created_at: now,
        updated_at: now,
    };
    let mut v = Validator::new();
    check_profile(&mut v, &profile);
    v.finish()?;

    let owner = require_user(storage, profile.user_id).await?;
    if owner.user_type != UserType::Business {
        return Err(KlozbuyError::invalid(
            "userId",
            "business profiles can only be created for business accounts",
        ));
    }
    storage.insert_business_profile(&profile).await?;
    info!(
        "Created business profile {} ({}) for {}",
        profile.business_name, profile.id, profile.user_id
    );
    Ok(profile)
}

pub async fn get_profile(storage: &dyn Storage, id: Uuid) -> Result<BusinessProfile> {
    debug!("Fetching business profile {}", id);
    storage
        .get_business_profile(id)
        .await?
        .ok_or_else(|| KlozbuyError::not_found("business profile", id))
}

pub async fn get_profile_by_user(storage: &dyn Storage, user_id: Uuid) -> Result<BusinessProfile> {
    storage
        .get_business_profile_by_user(user_id)
        .await?
        .ok_or_else(|| KlozbuyError::not_found("business profile for user", user_id))
}

pub async fn list_profiles(
    storage: &dyn Storage,
    page: Page,
    filter: &BusinessProfileFilter,
) -> Result<Vec<BusinessProfile>> {
    storage.list_business_profiles(filter, page).await
}

pub async fn update_profile(
    storage: &dyn Storage,
    id: Uuid,
    update: BusinessProfileUpdate,
) -> Result<BusinessProfile> {
    let mut profile = get_profile(storage, id).await?;
    if let Some(name) = update.business_name {
        profile.business_name = name.trim().to_string();
    }
    if let Some(category) = update.category {
        profile.category = category.trim().to_string();
    }
    if update.description.is_some() {
        profile.description = clean(update.description);
    }
    if update.website.is_some() {
        profile.website = clean(update.website);
    }
    if update.phone.is_some() {
        profile.phone = clean(update.phone);
    }
    if update.email.is_some() {
        profile.email = clean(update.email).map(|e| e.to_lowercase());
    }
    if let Some(hours) = update.opening_hours {
        profile.opening_hours = hours;
    }
    if let Some(location_id) = update.location_id {
        profile.location_id = location_id;
    }
    let mut v = Validator::new();
    check_profile(&mut v, &profile);
    v.finish()?;

    profile.updated_at = Utc::now();
    storage.update_business_profile(&profile).await?;
    info!("Updated business profile {}", profile.id);
    Ok(profile)
}

/// Verification is the only way to change `verified`.
pub async fn set_verified(storage: &dyn Storage, id: Uuid, verified: bool) -> Result<BusinessProfile> {
    let mut profile = get_profile(storage, id).await?;
    profile.verified = verified;
    profile.updated_at = Utc::now();
    storage.update_business_profile(&profile).await?;
    info!("Business profile {} verified={}", profile.id, verified);
    Ok(profile)
}

pub async fn delete_profile(storage: &dyn Storage, id: Uuid) -> Result<()> {
    if storage.delete_business_profile(id).await? {
        info!("Deleted business profile {}", id);
        Ok(())
    } else {
        Err(KlozbuyError::not_found("business profile", id))
    }
}

/// JSON-LD `LocalBusiness` document.
pub async fn structured_data(storage: &dyn Storage, id: Uuid) -> Result<Value> {
    let profile = get_profile(storage, id).await?;
    let location = match profile.location_id {
        Some(location_id) => storage.get_location(location_id).await?,
        None => None,
    };
    jsonld::business_profile_document(&profile, location.as_ref())
}
