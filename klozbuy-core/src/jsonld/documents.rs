use super::{Node, NodeType};
use crate::common::error::Result;
use crate::domain::{BusinessProfile, Location, Post, PostType, User, UserType};
use chrono::SecondsFormat;
use serde_json::Value;

/// `LocalBusiness` document for a business profile.
pub fn business_profile_document(
    profile: &BusinessProfile,
    location: Option<&Location>,
) -> Result<Value> {
    let hours: Vec<Node> = profile
        .opening_hours
        .iter()
        .map(|h| {
            Node::new(NodeType::OpeningHoursSpecification)
                .property(
                    "dayOfWeek",
                    format!("https://schema.org/{}", h.day.schema_org_name()),
                )
                .property("opens", h.opens.as_str())
                .property("closes", h.closes.as_str())
        })
        .collect();

    let mut node = Node::new(NodeType::LocalBusiness)
        .property("name", profile.business_name.as_str())
        .property("identifier", profile.id.to_string())
        .property("keywords", profile.category.as_str())
        .optional("description", profile.description.as_deref())
        .optional("url", profile.website.as_deref())
        .optional("telephone", profile.phone.as_deref())
        .optional("email", profile.email.as_deref())
        .nest_many("openingHoursSpecification", hours)?;

    if let Some(location) = location {
        node = node
            .nest("address", postal_address(location))?
            .nest("geo", geo_coordinates(location))?;
    }
    Ok(node.into_document())
}

/// Document for a post: `Product` for product listings, `Event` for events
/// and `SocialMediaPosting` for everything else.
pub fn post_document(
    post: &Post,
    author: &User,
    business: Option<&BusinessProfile>,
    location: Option<&Location>,
) -> Result<Value> {
    let node = match post.post_type {
        PostType::Product => {
            let mut node = Node::new(NodeType::Product)
                .property("name", post.title.clone().unwrap_or_else(|| summary(&post.content)))
                .property("description", post.content.as_str());
            if let Some(offer) = offer(post, author, business)? {
                node = node.nest("offers", offer)?;
            }
            node
        }
        PostType::Event => {
            let mut node = Node::new(NodeType::Event)
                .property("name", post.title.clone().unwrap_or_else(|| summary(&post.content)))
                .property("description", post.content.as_str())
                .optional(
                    "startDate",
                    post.event_start
                        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)),
                )
                .optional(
                    "endDate",
                    post.event_end
                        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)),
                )
                .nest("organizer", party(author, business))?;
            if let Some(location) = location {
                node = node.nest("location", place(location)?)?;
            }
            if let Some(offer) = offer(post, author, business)? {
                node = node.nest("offers", offer)?;
            }
            node
        }
        PostType::General | PostType::Service => {
            let mut node = Node::new(NodeType::SocialMediaPosting)
                .optional("headline", post.title.as_deref())
                .property("articleBody", post.content.as_str())
                .property(
                    "datePublished",
                    post.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                )
                .property(
                    "dateModified",
                    post.updated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                )
                .nest("author", party(author, business))?;
            if !post.hashtags.is_empty() {
                node = node.property("keywords", post.hashtags.join(","));
            }
            if let Some(location) = location {
                node = node.nest("contentLocation", place(location)?)?;
            }
            node
        }
    };
    Ok(node.property("identifier", post.id.to_string()).into_document())
}

/// Business accounts with a profile publish as their business.
fn party(author: &User, business: Option<&BusinessProfile>) -> Node {
    match (author.user_type, business) {
        (UserType::Business, Some(profile)) => Node::new(NodeType::Organization)
            .property("name", profile.business_name.as_str())
            .optional("url", profile.website.as_deref()),
        (UserType::Business, None) => {
            Node::new(NodeType::Organization).property("name", author.display_name.as_str())
        }
        (UserType::Individual, _) => Node::new(NodeType::Person)
            .property("name", author.display_name.as_str())
            .property("alternateName", format!("@{}", author.username)),
    }
}

fn offer(post: &Post, author: &User, business: Option<&BusinessProfile>) -> Result<Option<Node>> {
    let Some(price) = post.price else {
        return Ok(None);
    };
    Node::new(NodeType::Offer)
        .property("price", format_minor_units(price))
        .property("priceCurrency", post.currency.as_str())
        .nest("seller", party(author, business))
        .map(Some)
}

fn place(location: &Location) -> Result<Node> {
    Node::new(NodeType::Place)
        .optional("name", location.name.as_deref())
        .nest("address", postal_address(location))?
        .nest("geo", geo_coordinates(location))
}

fn postal_address(location: &Location) -> Node {
    Node::new(NodeType::PostalAddress)
        .optional("streetAddress", location.address.as_deref())
        .property("addressLocality", location.city.as_str())
        .optional("addressRegion", location.state.as_deref())
        .optional("postalCode", location.postal_code.as_deref())
        .property("addressCountry", location.country.as_str())
}

fn geo_coordinates(location: &Location) -> Node {
    Node::new(NodeType::GeoCoordinates)
        .property("latitude", location.latitude)
        .property("longitude", location.longitude)
}

/// `150000` kobo becomes `"1500.00"`.
fn format_minor_units(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let amount = amount.unsigned_abs();
    format!("{sign}{}.{:02}", amount / 100, amount % 100)
}

/// First line of the content, cut to a headline-sized length.
fn summary(content: &str) -> String {
    let line = content.lines().next().unwrap_or_default().trim();
    let mut out: String = line.chars().take(110).collect();
    if line.chars().count() > 110 {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OpeningHours, Weekday, DEFAULT_CURRENCY};
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn lekki() -> Location {
        let now = Utc::now();
        Location {
            id: Uuid::new_v4(),
            name: Some("Lekki Phase 1".to_string()),
            address: Some("12 Admiralty Way".to_string()),
            city: "Lagos".to_string(),
            state: Some("Lagos".to_string()),
            country: "Nigeria".to_string(),
            postal_code: None,
            latitude: 6.4474,
            longitude: 3.4723,
            created_at: now,
            updated_at: now,
        }
    }

    fn author(user_type: UserType) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            username: "mama_t".to_string(),
            email: "t@example.ng".to_string(),
            display_name: "Mama T".to_string(),
            bio: None,
            avatar_url: None,
            phone: None,
            user_type,
            location_id: None,
            followers_count: 0,
            following_count: 0,
            posts_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn profile(user: &User) -> BusinessProfile {
        let now = Utc::now();
        BusinessProfile {
            id: Uuid::new_v4(),
            user_id: user.id,
            business_name: "Mama T Kitchen".to_string(),
            category: "Restaurant".to_string(),
            description: Some("Amala and ewedu".to_string()),
            website: Some("https://mamat.ng".to_string()),
            phone: None,
            email: None,
            opening_hours: vec![OpeningHours {
                day: Weekday::Monday,
                opens: "08:00".to_string(),
                closes: "20:00".to_string(),
            }],
            location_id: None,
            verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn post(post_type: PostType) -> Post {
        let now = Utc::now();
        Post {
            id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            post_type,
            title: None,
            content: "Jollof rice party\nBring a friend".to_string(),
            price: None,
            currency: DEFAULT_CURRENCY.to_string(),
            event_start: None,
            event_end: None,
            location_id: None,
            hashtags: vec!["jollof".to_string()],
            likes_count: 0,
            comments_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn business_document_nests_address_geo_and_hours() {
        let user = author(UserType::Business);
        let doc = business_profile_document(&profile(&user), Some(&lekki())).expect("document");
        assert_eq!(doc["@type"], "LocalBusiness");
        assert_eq!(doc["address"]["addressLocality"], "Lagos");
        assert_eq!(doc["geo"]["latitude"], 6.4474);
        assert_eq!(
            doc["openingHoursSpecification"][0]["dayOfWeek"],
            "https://schema.org/Monday"
        );
    }

    #[test]
    fn product_price_is_in_major_units() {
        let user = author(UserType::Business);
        let mut p = post(PostType::Product);
        p.price = Some(150_050);
        p.title = Some("Ankara fabric".to_string());
        let doc = post_document(&p, &user, Some(&profile(&user)), None).expect("document");
        assert_eq!(doc["@type"], "Product");
        assert_eq!(doc["offers"]["price"], "1500.50");
        assert_eq!(doc["offers"]["priceCurrency"], "NGN");
        assert_eq!(doc["offers"]["seller"]["name"], "Mama T Kitchen");
    }

    #[test]
    fn event_uses_place_and_dates() {
        let user = author(UserType::Individual);
        let mut p = post(PostType::Event);
        p.event_start = Some(Utc.with_ymd_and_hms(2026, 12, 24, 18, 0, 0).unwrap());
        let doc = post_document(&p, &user, None, Some(&lekki())).expect("document");
        assert_eq!(doc["@type"], "Event");
        assert_eq!(doc["name"], "Jollof rice party");
        assert_eq!(doc["startDate"], "2026-12-24T18:00:00Z");
        assert_eq!(doc["location"]["@type"], "Place");
        assert_eq!(doc["location"]["address"]["@type"], "PostalAddress");
        assert_eq!(doc["organizer"]["@type"], "Person");
    }

    #[test]
    fn general_post_is_a_social_media_posting() {
        let user = author(UserType::Individual);
        let doc = post_document(&post(PostType::General), &user, None, None).expect("document");
        assert_eq!(doc["@type"], "SocialMediaPosting");
        assert_eq!(doc["author"]["alternateName"], "@mama_t");
        assert_eq!(doc["keywords"], "jollof");
    }

    #[test]
    fn minor_units_format() {
        assert_eq!(format_minor_units(0), "0.00");
        assert_eq!(format_minor_units(5), "0.05");
        assert_eq!(format_minor_units(120_000), "1200.00");
    }
}
