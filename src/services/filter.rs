//! Search, facet filtering, place scoping and pagination over in-memory
//! collections. Everything here is pure; the inputs are never modified.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::models::{Bike, Booking, Coupon, EntityId, Notification, Place, Session, User};

/// Facet value that disables the facet.
pub const ALL: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Facet {
    Status,
    Category,
    Brand,
    Place,
    PaymentStatus,
    Priority,
    Read,
}

pub trait Searchable {
    /// Fields the free-text query is matched against.
    fn text_fields(&self) -> Vec<Option<&str>>;

    fn facet(&self, facet: Facet) -> Option<Cow<'_, str>>;

    fn place_id(&self) -> Option<&EntityId> {
        None
    }

    fn sort_date(&self) -> Option<NaiveDateTime> {
        None
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    pub query: String,
    pub facets: Vec<(Facet, String)>,
}

impl FilterSpec {
    pub fn query(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            facets: Vec::new(),
        }
    }

    pub fn with_facet(mut self, facet: Facet, value: impl Into<String>) -> Self {
        self.facets.push((facet, value.into()));
        self
    }
}

/// Visibility restrictions applied before any user-supplied filter.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub place: Option<EntityId>,
    pub hidden_places: HashSet<EntityId>,
}

impl Scope {
    pub fn unrestricted() -> Self {
        Self::default()
    }

    pub fn for_session(session: &Session) -> Self {
        Self {
            place: session.place_scope().cloned(),
            hidden_places: HashSet::new(),
        }
    }

    pub fn hiding(mut self, places: impl IntoIterator<Item = EntityId>) -> Self {
        self.hidden_places.extend(places);
        self
    }

    pub fn admits<T: Searchable>(&self, record: &T) -> bool {
        if let Some(place) = &self.place {
            if record.place_id() != Some(place) {
                return false;
            }
        }
        match record.place_id() {
            Some(place) => !self.hidden_places.contains(place),
            None => true,
        }
    }
}

pub fn is_wildcard(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.eq_ignore_ascii_case(ALL)
}

fn facet_matches<T: Searchable>(record: &T, facet: Facet, selected: &str) -> bool {
    if is_wildcard(selected) {
        return true;
    }
    match record.facet(facet) {
        Some(value) => value.trim().eq_ignore_ascii_case(selected.trim()),
        None => false,
    }
}

fn text_matches<T: Searchable>(record: &T, needle: &str) -> bool {
    record
        .text_fields()
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(needle))
}

/// Records visible under `scope` that match every facet and, when the query
/// is non-empty, contain it in at least one text field. Order is preserved.
pub fn filter<'a, T: Searchable>(records: &'a [T], scope: &Scope, spec: &FilterSpec) -> Vec<&'a T> {
    let needle = spec.query.to_lowercase();
    records
        .iter()
        .filter(|r| scope.admits(*r))
        .filter(|r| {
            spec.facets
                .iter()
                .all(|(facet, selected)| facet_matches(*r, *facet, selected))
        })
        .filter(|r| needle.is_empty() || text_matches(*r, &needle))
        .collect()
}

/// Newest first; records without a date go last. Stable.
pub fn sort_latest_first<T: Searchable>(records: &mut [&T]) {
    records.sort_by(|a, b| b.sort_date().cmp(&a.sort_date()));
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

/// 1-based page of `items`. Out-of-range pages clamp to `[1, total_pages]`;
/// an empty input is page 1 of 0.
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size);
    let page = page.clamp(1, total_pages.max(1));

    let items = items
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();

    Page {
        items,
        page,
        page_size,
        total_items,
        total_pages,
    }
}

/// Query, facet and page selection of one listing. Changing the query or
/// any facet sends the listing back to page 1.
#[derive(Debug, Clone, PartialEq)]
pub struct ListState {
    query: String,
    facets: BTreeMap<Facet, String>,
    page: usize,
}

impl Default for ListState {
    fn default() -> Self {
        Self {
            query: String::new(),
            facets: BTreeMap::new(),
            page: 1,
        }
    }
}

impl ListState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Returns whether the query changed.
    pub fn set_query(&mut self, query: &str) -> bool {
        if self.query == query {
            return false;
        }
        self.query = query.to_string();
        self.page = 1;
        true
    }

    /// Returns whether the selection changed.
    pub fn set_facet(&mut self, facet: Facet, value: &str) -> bool {
        let changed = if is_wildcard(value) {
            self.facets.remove(&facet).is_some()
        } else {
            let value = value.trim().to_string();
            self.facets.insert(facet, value.clone()) != Some(value)
        };
        if changed {
            self.page = 1;
        }
        changed
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    /// Applies one request's full selection. The requested page is honoured
    /// only when the filters are unchanged.
    pub fn update(&mut self, query: &str, facets: &[(Facet, &str)], page: Option<usize>) {
        let mut changed = self.set_query(query);
        let present: HashSet<Facet> = facets.iter().map(|(f, _)| *f).collect();
        let dropped: Vec<Facet> = self
            .facets
            .keys()
            .filter(|f| !present.contains(f))
            .copied()
            .collect();
        for facet in dropped {
            changed |= self.set_facet(facet, ALL);
        }
        for (facet, value) in facets {
            changed |= self.set_facet(*facet, value);
        }
        if !changed {
            if let Some(page) = page {
                self.set_page(page);
            }
        }
    }

    pub fn spec(&self) -> FilterSpec {
        FilterSpec {
            query: self.query.clone(),
            facets: self
                .facets
                .iter()
                .map(|(f, v)| (*f, v.clone()))
                .collect(),
        }
    }

    pub fn apply<'a, T: Searchable>(
        &self,
        records: &'a [T],
        scope: &Scope,
        page_size: usize,
        latest_first: bool,
    ) -> Page<&'a T> {
        let mut matched = filter(records, scope, &self.spec());
        if latest_first {
            sort_latest_first(&mut matched);
        }
        paginate(matched, self.page, page_size)
    }
}

impl Searchable for Bike {
    fn text_fields(&self) -> Vec<Option<&str>> {
        vec![
            self.name.as_deref(),
            self.model.as_deref(),
            self.brand.as_deref(),
            self.category.as_deref(),
            self.registration_number.as_deref(),
        ]
    }

    fn facet(&self, facet: Facet) -> Option<Cow<'_, str>> {
        match facet {
            Facet::Status => Some(Cow::Borrowed(self.status.as_str())),
            Facet::Category => self.category.as_deref().map(Cow::Borrowed),
            Facet::Brand => self.brand.as_deref().map(Cow::Borrowed),
            Facet::Place => self.place_id.as_ref().map(|p| Cow::Borrowed(p.as_str())),
            _ => None,
        }
    }

    fn place_id(&self) -> Option<&EntityId> {
        self.place_id.as_ref()
    }
}

impl Searchable for Booking {
    fn text_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(self.id.as_str()),
            self.customer_name.as_deref(),
            self.customer_email.as_deref(),
            self.bike_name.as_deref(),
            self.payment_id.as_deref(),
        ]
    }

    fn facet(&self, facet: Facet) -> Option<Cow<'_, str>> {
        match facet {
            Facet::Status => Some(Cow::Borrowed(self.booking_status.as_str())),
            Facet::PaymentStatus => Some(Cow::Borrowed(self.payment_status.as_str())),
            Facet::Place => self.place_id.as_ref().map(|p| Cow::Borrowed(p.as_str())),
            _ => None,
        }
    }

    fn place_id(&self) -> Option<&EntityId> {
        self.place_id.as_ref()
    }

    fn sort_date(&self) -> Option<NaiveDateTime> {
        Booking::sort_date(self)
    }
}

impl Searchable for Notification {
    fn text_fields(&self) -> Vec<Option<&str>> {
        vec![
            self.title.as_deref(),
            self.description.as_deref(),
            self.kind.as_deref(),
        ]
    }

    fn facet(&self, facet: Facet) -> Option<Cow<'_, str>> {
        match facet {
            Facet::Priority => Some(Cow::Borrowed(self.priority.as_str())),
            Facet::Read | Facet::Status => Some(Cow::Borrowed(self.status_label())),
            _ => None,
        }
    }

    fn sort_date(&self) -> Option<NaiveDateTime> {
        self.created_at
    }
}

impl Searchable for User {
    fn text_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(self.id.as_str()),
            self.name.as_deref(),
            self.email.as_deref(),
        ]
    }

    fn facet(&self, facet: Facet) -> Option<Cow<'_, str>> {
        match facet {
            Facet::Status => self.role.as_deref().map(Cow::Borrowed),
            Facet::Place => self.place_id.as_ref().map(|p| Cow::Borrowed(p.as_str())),
            _ => None,
        }
    }
}

impl Searchable for Place {
    fn text_fields(&self) -> Vec<Option<&str>> {
        vec![self.name.as_deref(), self.location.as_deref()]
    }

    fn facet(&self, facet: Facet) -> Option<Cow<'_, str>> {
        match facet {
            Facet::Status => Some(Cow::Borrowed(if self.enabled { "ENABLED" } else { "DISABLED" })),
            _ => None,
        }
    }
}

impl Searchable for Coupon {
    fn text_fields(&self) -> Vec<Option<&str>> {
        vec![Some(self.code.as_str()), self.description.as_deref()]
    }

    fn facet(&self, facet: Facet) -> Option<Cow<'_, str>> {
        match facet {
            Facet::Status => Some(Cow::Borrowed(if self.active { "ACTIVE" } else { "INACTIVE" })),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RawBike, RawBooking, Role};
    use serde_json::{json, Value};

    fn bike(value: Value) -> Bike {
        serde_json::from_value::<RawBike>(value)
            .unwrap()
            .normalize()
            .unwrap()
    }

    fn booking(value: Value) -> Booking {
        serde_json::from_value::<RawBooking>(value)
            .unwrap()
            .normalize()
            .unwrap()
    }

    fn fleet() -> Vec<Bike> {
        vec![
            bike(json!({"id": 1, "name": "Activa", "category": "Scooter", "brand": "Honda", "placeId": 7})),
            bike(json!({"id": 2, "name": "Classic 350", "category": "Cruiser", "brand": "Royal Enfield", "placeId": 7, "status": "RENTED"})),
            bike(json!({"id": 3, "name": "Duke", "model": "390", "category": "Street", "brand": "KTM", "placeId": 9})),
            bike(json!({"id": 4, "model": "Jupiter", "category": "Scooter", "registrationNumber": "KA01AB1234"})),
        ]
    }

    fn ids<T: Searchable + HasId>(records: &[&T]) -> Vec<String> {
        records.iter().map(|r| r.id_str().to_string()).collect()
    }

    trait HasId {
        fn id_str(&self) -> &str;
    }

    impl HasId for Bike {
        fn id_str(&self) -> &str {
            self.id.as_str()
        }
    }

    impl HasId for Booking {
        fn id_str(&self) -> &str {
            self.id.as_str()
        }
    }

    fn admin_at(place: &str) -> Session {
        Session {
            token: "t".to_string(),
            user_id: None,
            role: Role::Admin,
            display_name: "A".to_string(),
            place_id: Some(EntityId::from(place)),
        }
    }

    #[test]
    fn test_empty_query_returns_everything_in_order() {
        let bikes = fleet();
        let out = filter(&bikes, &Scope::unrestricted(), &FilterSpec::default());
        assert_eq!(ids(&out), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_query_is_case_insensitive_substring() {
        let bikes = vec![
            bike(json!({"id": 1, "name": "Activa", "category": "Scooter"})),
            bike(json!({"id": 2, "name": "Classic 350", "category": "Cruiser"})),
        ];
        let out = filter(&bikes, &Scope::unrestricted(), &FilterSpec::query("cla"));
        assert_eq!(ids(&out), vec!["2"]);
    }

    #[test]
    fn test_query_whitespace_is_part_of_the_needle() {
        let bikes = vec![
            bike(json!({"id": 1, "name": "Classic 350"})),
            bike(json!({"id": 2, "name": "Royal Classic"})),
        ];
        let scope = Scope::unrestricted();
        assert_eq!(ids(&filter(&bikes, &scope, &FilterSpec::query(" cla"))), vec!["2"]);
        assert_eq!(ids(&filter(&bikes, &scope, &FilterSpec::query("c 3"))), vec!["1"]);
    }

    #[test]
    fn test_query_matches_any_configured_field() {
        let bikes = fleet();
        let scope = Scope::unrestricted();
        assert_eq!(ids(&filter(&bikes, &scope, &FilterSpec::query("ktm"))), vec!["3"]);
        assert_eq!(ids(&filter(&bikes, &scope, &FilterSpec::query("ka01"))), vec!["4"]);
        assert_eq!(ids(&filter(&bikes, &scope, &FilterSpec::query("SCOOT"))), vec!["1", "4"]);
        assert!(filter(&bikes, &scope, &FilterSpec::query("harley")).is_empty());
    }

    #[test]
    fn test_missing_fields_do_not_match_or_panic() {
        let bikes = vec![bike(json!({"id": 1}))];
        let scope = Scope::unrestricted();
        assert!(filter(&bikes, &scope, &FilterSpec::query("a")).is_empty());
        assert!(filter(&bikes, &scope, &FilterSpec::default().with_facet(Facet::Brand, "Honda")).is_empty());
        assert_eq!(filter(&bikes, &scope, &FilterSpec::default().with_facet(Facet::Brand, "all")).len(), 1);
    }

    #[test]
    fn test_facets_combine_with_and() {
        let bikes = fleet();
        let spec = FilterSpec::default()
            .with_facet(Facet::Category, "Scooter")
            .with_facet(Facet::Brand, "Honda");
        assert_eq!(ids(&filter(&bikes, &Scope::unrestricted(), &spec)), vec!["1"]);

        let spec = FilterSpec::query("classic").with_facet(Facet::Status, "AVAILABLE");
        assert!(filter(&bikes, &Scope::unrestricted(), &spec).is_empty());

        let spec = FilterSpec::query("classic").with_facet(Facet::Status, "ALL");
        assert_eq!(ids(&filter(&bikes, &Scope::unrestricted(), &spec)), vec!["2"]);
    }

    #[test]
    fn test_admin_scope_restricts_to_session_place() {
        let bikes = vec![
            bike(json!({"id": 1, "placeId": 7})),
            bike(json!({"id": 2, "place": {"id": "7"}})),
            bike(json!({"id": 3, "place_id": 9})),
        ];
        let scope = Scope::for_session(&admin_at("7"));
        let out = filter(&bikes, &scope, &FilterSpec::default());
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|b| b.place_id == Some(EntityId::from("7"))));
    }

    #[test]
    fn test_scope_applies_before_user_facets() {
        let bikes = fleet();
        let scope = Scope::for_session(&admin_at("7"));
        let spec = FilterSpec::default().with_facet(Facet::Place, "9");
        assert!(filter(&bikes, &scope, &spec).is_empty());
    }

    #[test]
    fn test_hidden_places() {
        let bikes = fleet();
        let scope = Scope::unrestricted().hiding([EntityId::from("9")]);
        assert_eq!(ids(&filter(&bikes, &scope, &FilterSpec::default())), vec!["1", "2", "4"]);
    }

    #[test]
    fn test_pagination_covers_every_record_once() {
        let items: Vec<u32> = (1..=45).collect();
        let size = 20;
        let first = paginate(items.clone(), 1, size);
        assert_eq!(first.total_pages, 3);

        let mut seen = Vec::new();
        for n in 1..=first.total_pages {
            let page = paginate(items.clone(), n, size);
            if n < first.total_pages {
                assert_eq!(page.items.len(), size);
            }
            seen.extend(page.items);
        }
        assert_eq!(seen, items);
    }

    #[test]
    fn test_pagination_clamps() {
        let items: Vec<u32> = (1..=25).collect();
        let page = paginate(items.clone(), 99, 20);
        assert_eq!(page.page, 2);
        assert_eq!(page.items, (21..=25).collect::<Vec<_>>());

        let page = paginate(items, 0, 20);
        assert_eq!(page.page, 1);
        assert_eq!(page.items.len(), 20);
    }

    #[test]
    fn test_pagination_of_nothing() {
        let page = paginate(Vec::<u32>::new(), 3, 20);
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.page, 1);
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_sort_latest_first_puts_dateless_last() {
        let bookings = vec![
            booking(json!({"id": 1, "createdAt": "2024-01-01 10:00"})),
            booking(json!({"id": 2})),
            booking(json!({"id": 3, "createdAt": "2024-03-01 10:00"})),
            booking(json!({"id": 4, "createdAt": [2024, 2, 1]})),
        ];
        let mut refs: Vec<&Booking> = bookings.iter().collect();
        sort_latest_first(&mut refs);
        assert_eq!(ids(&refs), vec!["3", "4", "1", "2"]);
    }

    #[test]
    fn test_booking_search_fields() {
        let bookings = vec![
            booking(json!({"id": 101, "user": {"name": "Meera", "email": "meera@x.io"}, "bike": {"id": 1, "name": "Activa"}})),
            booking(json!({"id": 102, "paymentId": "pay_ZZ9", "bike": {"id": 2, "name": "Duke"}})),
        ];
        let scope = Scope::unrestricted();
        assert_eq!(ids(&filter(&bookings, &scope, &FilterSpec::query("MEERA@"))), vec!["101"]);
        assert_eq!(ids(&filter(&bookings, &scope, &FilterSpec::query("zz9"))), vec!["102"]);
        assert_eq!(ids(&filter(&bookings, &scope, &FilterSpec::query("102"))), vec!["102"]);
        assert_eq!(ids(&filter(&bookings, &scope, &FilterSpec::query("duke"))), vec!["102"]);
    }

    #[test]
    fn test_list_state_resets_page_on_filter_change() {
        let mut state = ListState::new();
        state.update("", &[], Some(3));
        assert_eq!(state.page(), 3);

        state.update("cla", &[], Some(3));
        assert_eq!(state.page(), 1);

        state.update("cla", &[], Some(2));
        assert_eq!(state.page(), 2);

        state.update("cla", &[(Facet::Status, "RENTED")], Some(2));
        assert_eq!(state.page(), 1);

        state.update("cla", &[(Facet::Status, "RENTED")], Some(4));
        assert_eq!(state.page(), 4);

        // Dropping a facet is a change too.
        state.update("cla", &[], Some(4));
        assert_eq!(state.page(), 1);
    }

    #[test]
    fn test_list_state_wildcard_is_no_change() {
        let mut state = ListState::new();
        state.set_page(5);
        assert!(!state.set_facet(Facet::Brand, "all"));
        assert_eq!(state.page(), 5);
        assert!(!state.set_query(""));
        assert_eq!(state.page(), 5);
    }

    #[test]
    fn test_list_state_apply() {
        let bikes = fleet();
        let mut state = ListState::new();
        state.update("", &[(Facet::Category, "Scooter")], None);
        let page = state.apply(&bikes, &Scope::unrestricted(), 1, false);
        assert_eq!(page.total_items, 2);
        assert_eq!(page.total_pages, 2);
        assert_eq!(ids(&page.items), vec!["1"]);
    }
}
