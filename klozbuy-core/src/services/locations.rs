use crate::common::error::{KlozbuyError, Result};
use crate::common::pagination::Page;
use crate::domain::*;
use crate::geo::{bounding_box, haversine_km};
use crate::storage::Storage;
use crate::validation::{clean, Validator};
use chrono::Utc;
use std::cmp::Ordering;
use tracing::{debug, info};
use uuid::Uuid;

pub const MAX_RADIUS_KM: f64 = 500.0;
const TEXT_MAX: usize = 200;

fn check_coordinates(v: &mut Validator, location: &Location) {
    v.length("city", &location.city, 1, TEXT_MAX)
        .optional_length("name", location.name.as_deref(), TEXT_MAX)
        .optional_length("address", location.address.as_deref(), TEXT_MAX)
        .optional_length("state", location.state.as_deref(), TEXT_MAX)
        .length("country", &location.country, 1, TEXT_MAX)
        .optional_length("postalCode", location.postal_code.as_deref(), 20)
        .latitude("latitude", location.latitude)
        .longitude("longitude", location.longitude);
}

pub async fn create_location(storage: &dyn Storage, input: NewLocation) -> Result<Location> {
    let now = Utc::now();
    let location = Location {
        id: Uuid::new_v4(),
        name: clean(input.name),
        address: clean(input.address),
        city: input.city.trim().to_string(),
        state: clean(input.state),
        country: clean(input.country).unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
        postal_code: clean(input.postal_code),
        latitude: input.latitude,
        longitude: input.longitude,
        created_at: now,
        updated_at: now,
    };
    let mut v = Validator::new();
    check_coordinates(&mut v, &location);
    v.finish()?;

    storage.insert_location(&location).await?;
    info!(
        "Created location {} at ({}, {})",
        location.id, location.latitude, location.longitude
    );
    Ok(location)
}

pub async fn get_location(storage: &dyn Storage, id: Uuid) -> Result<Location> {
    debug!("Fetching location {}", id);
    storage
        .get_location(id)
        .await?
        .ok_or_else(|| KlozbuyError::not_found("location", id))
}

pub async fn list_locations(
    storage: &dyn Storage,
    page: Page,
    filter: &LocationFilter,
) -> Result<Vec<Location>> {
    storage.list_locations(filter, page).await
}

pub async fn update_location(
    storage: &dyn Storage,
    id: Uuid,
    update: LocationUpdate,
) -> Result<Location> {
    let mut location = get_location(storage, id).await?;
    if update.name.is_some() {
        location.name = clean(update.name);
    }
    if update.address.is_some() {
        location.address = clean(update.address);
    }
    if let Some(city) = update.city {
        location.city = city.trim().to_string();
    }
    if update.state.is_some() {
        location.state = clean(update.state);
    }
    if let Some(country) = update.country {
        location.country = country.trim().to_string();
    }
    if update.postal_code.is_some() {
        location.postal_code = clean(update.postal_code);
    }
    if let Some(latitude) = update.latitude {
        location.latitude = latitude;
    }
    if let Some(longitude) = update.longitude {
        location.longitude = longitude;
    }
    let mut v = Validator::new();
    check_coordinates(&mut v, &location);
    v.finish()?;

    location.updated_at = Utc::now();
    storage.update_location(&location).await?;
    info!("Updated location {}", location.id);
    Ok(location)
}

pub async fn delete_location(storage: &dyn Storage, id: Uuid) -> Result<()> {
    if storage.delete_location(id).await? {
        info!("Deleted location {}", id);
        Ok(())
    } else {
        Err(KlozbuyError::not_found("location", id))
    }
}

/// Locations within `radius_km` of the origin, closest first.
pub async fn nearby(
    storage: &dyn Storage,
    latitude: f64,
    longitude: f64,
    radius_km: f64,
    page: Page,
) -> Result<Vec<NearbyLocation>> {
    Validator::new()
        .latitude("lat", latitude)
        .longitude("lon", longitude)
        .check(
            radius_km.is_finite() && radius_km > 0.0 && radius_km <= MAX_RADIUS_KM,
            "radiusKm",
            format!("must be greater than 0 and at most {MAX_RADIUS_KM}"),
        )
        .finish()?;

    let candidates = storage
        .locations_within(bounding_box(latitude, longitude, radius_km))
        .await?;
    let mut found: Vec<NearbyLocation> = candidates
        .into_iter()
        .map(|location| NearbyLocation {
            distance_km: haversine_km(latitude, longitude, location.latitude, location.longitude),
            location,
        })
        .filter(|n| n.distance_km <= radius_km)
        .collect();
    found.sort_by(|a, b| {
        a.distance_km
            .partial_cmp(&b.distance_km)
            .unwrap_or(Ordering::Equal)
    });
    debug!(
        "{} locations within {} km of ({}, {})",
        found.len(),
        radius_km,
        latitude,
        longitude
    );
    Ok(page.apply(found))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{fixtures, posts};

    fn place(city: &str, latitude: f64, longitude: f64) -> NewLocation {
        NewLocation {
            city: city.to_string(),
            latitude,
            longitude,
            ..NewLocation::default()
        }
    }

    #[tokio::test]
    async fn create_defaults_country_and_validates_coordinates() {
        let storage = fixtures::storage();
        let yaba = create_location(&storage, place("Lagos", 6.5095, 3.3711))
            .await
            .expect("create");
        assert_eq!(yaba.country, "Nigeria");

        let err = create_location(&storage, place("Nowhere", 95.0, 200.0))
            .await
            .expect_err("out of range");
        let KlozbuyError::Validation(issues) = err else {
            panic!("expected validation error");
        };
        let fields: Vec<_> = issues.iter().map(|i| i.field.as_str()).collect();
        assert_eq!(fields, vec!["latitude", "longitude"]);
    }

    #[tokio::test]
    async fn nearby_sorts_by_distance_and_drops_far_points() {
        let storage = fixtures::storage();
        let ikeja = create_location(&storage, place("Ikeja", 6.6018, 3.3515)).await.expect("ikeja");
        let yaba = create_location(&storage, place("Yaba", 6.5095, 3.3711)).await.expect("yaba");
        create_location(&storage, place("Abuja", 9.0765, 7.3986)).await.expect("abuja");

        // Origin at Lagos Island.
        let found = nearby(&storage, 6.4541, 3.3947, 25.0, Page::default())
            .await
            .expect("nearby");
        let ids: Vec<_> = found.iter().map(|n| n.location.id).collect();
        assert_eq!(ids, vec![yaba.id, ikeja.id]);
        assert!(found[0].distance_km < found[1].distance_km);
        assert!(found.iter().all(|n| n.distance_km <= 25.0));
    }

    #[tokio::test]
    async fn nearby_rejects_bad_radius() {
        let storage = fixtures::storage();
        for radius in [0.0, -1.0, 500.5, f64::NAN] {
            let err = nearby(&storage, 6.45, 3.39, radius, Page::default())
                .await
                .expect_err("bad radius");
            assert!(matches!(err, KlozbuyError::Validation(_)), "radius {radius}");
        }
    }

    #[tokio::test]
    async fn delete_clears_references() {
        let storage = fixtures::storage();
        let ada = fixtures::user(&storage, "ada").await;
        let yaba = create_location(&storage, place("Yaba", 6.5095, 3.3711)).await.expect("yaba");
        let post = posts::create_post(
            &storage,
            NewPost {
                author_id: ada.id,
                content: "Market day".to_string(),
                location_id: Some(yaba.id),
                ..NewPost::default()
            },
        )
        .await
        .expect("post");

        delete_location(&storage, yaba.id).await.expect("delete");
        let post = posts::get_post(&storage, post.id).await.expect("post");
        assert_eq!(post.location_id, None);
        let err = get_location(&storage, yaba.id).await.expect_err("gone");
        assert!(matches!(err, KlozbuyError::NotFound { .. }));
    }

    #[tokio::test]
    async fn update_merges_fields() {
        let storage = fixtures::storage();
        let loc = create_location(&storage, place("Yaba", 6.5095, 3.3711)).await.expect("yaba");
        let updated = update_location(
            &storage,
            loc.id,
            LocationUpdate {
                name: Some("Tejuosho Market".to_string()),
                ..LocationUpdate::default()
            },
        )
        .await
        .expect("update");
        assert_eq!(updated.name.as_deref(), Some("Tejuosho Market"));
        assert_eq!(updated.city, "Yaba");
    }

    #[tokio::test]
    async fn list_filters_by_city() {
        let storage = fixtures::storage();
        create_location(&storage, place("Ibadan", 7.3775, 3.9470)).await.expect("ibadan");
        create_location(&storage, place("Lagos", 6.5244, 3.3792)).await.expect("lagos");
        let filter = LocationFilter {
            city: Some("lagos".to_string()),
            ..LocationFilter::default()
        };
        let found = list_locations(&storage, Page::default(), &filter).await.expect("list");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].city, "Lagos");
    }
}
