use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use crate::api::RentalApi;
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::{Banner, Bike, Booking, Coupon, EntityId, Notification, Place, Session, User};
use crate::services::filter::{ListState, Scope};
use crate::services::session::SessionContext;
use crate::services::store::{Collection, Keyed};

pub struct AppState {
    pub config: AppConfig,
    pub api: RentalApi,
    pub session: SessionContext,
    pub bikes: Collection<Bike>,
    pub bookings: Collection<Booking>,
    pub places: Collection<Place>,
    pub notifications: Collection<Notification>,
    pub coupons: Collection<Coupon>,
    pub banners: Collection<Banner>,
    pub users: Collection<User>,
    pub admins: Collection<User>,
    /// Place the loaded notifications belong to.
    pub notifications_place: Mutex<Option<EntityId>>,
    views: Mutex<HashMap<&'static str, ListState>>,
}

impl AppState {
    pub fn new(config: AppConfig, api: RentalApi) -> Self {
        Self {
            config,
            api,
            session: SessionContext::new(),
            bikes: Collection::new(),
            bookings: Collection::new(),
            places: Collection::new(),
            notifications: Collection::new(),
            coupons: Collection::new(),
            banners: Collection::new(),
            users: Collection::new(),
            admins: Collection::new(),
            notifications_place: Mutex::new(None),
            views: Mutex::new(HashMap::new()),
        }
    }

    /// Replaces any previous session, dropping everything loaded under it.
    pub fn sign_in(&self, session: Session) -> Result<(), AppError> {
        self.reset();
        self.session.begin(session)
    }

    /// Ends the session and forgets every loaded list and view.
    pub fn reset(&self) {
        self.session.end();
        self.bikes.clear();
        self.bookings.clear();
        self.places.clear();
        self.notifications.clear();
        self.coupons.clear();
        self.banners.clear();
        self.users.clear();
        self.admins.clear();
        *self
            .notifications_place
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
        self.views
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Awaits a remote call. A rejected token ends the session.
    pub async fn remote<T>(
        &self,
        call: impl Future<Output = Result<T, AppError>>,
    ) -> Result<T, AppError> {
        let result = call.await;
        if let Err(AppError::Unauthenticated) = &result {
            tracing::warn!("remote rejected the session, logging out");
            self.reset();
        }
        result
    }

    /// Cached list, fetched when missing or when `refresh` is set.
    pub async fn load<T, F>(
        &self,
        collection: &Collection<T>,
        refresh: bool,
        fetch: F,
    ) -> Result<Arc<Vec<T>>, AppError>
    where
        T: Clone + Keyed,
        F: Future<Output = Result<Vec<T>, AppError>>,
    {
        if !refresh {
            if let Some(items) = collection.items() {
                return Ok(items);
            }
        }
        let ticket = collection.begin_fetch();
        let items = self.remote(fetch).await?;
        let count = items.len();
        if collection.apply(ticket, items) {
            tracing::debug!(count, "collection refreshed");
        }
        Ok(collection.items().unwrap_or_default())
    }

    pub async fn places_for(&self, session: &Session, refresh: bool) -> Result<Arc<Vec<Place>>, AppError> {
        self.load(&self.places, refresh, self.api.list_places(session))
            .await
    }

    /// Visibility for `session`, hiding disabled places when configured.
    pub async fn scope(&self, session: &Session) -> Result<Scope, AppError> {
        let scope = Scope::for_session(session);
        if !self.config.hide_disabled_places {
            return Ok(scope);
        }
        let places = self.places_for(session, false).await?;
        Ok(scope.hiding(
            places
                .iter()
                .filter(|p| !p.enabled)
                .map(|p| p.id.clone()),
        ))
    }

    /// Bookings are fetched per place for place-scoped sessions, so only the
    /// hidden-place part of the scope still applies to them.
    pub async fn booking_scope(&self, session: &Session) -> Result<Scope, AppError> {
        let scope = self.scope(session).await?;
        Ok(Scope {
            place: None,
            ..scope
        })
    }

    /// Runs `f` against the stored state of the listing called `name`.
    pub fn view<R>(&self, name: &'static str, f: impl FnOnce(&mut ListState) -> R) -> R {
        let mut views = self.views.lock().unwrap_or_else(PoisonError::into_inner);
        f(views.entry(name).or_default())
    }
}
