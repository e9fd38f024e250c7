pub mod banner;
pub mod bike;
pub mod booking;
pub mod coupon;
pub mod date;
pub mod id;
pub mod notification;
pub mod place;
pub mod session;
pub mod user;
pub mod value;

pub use banner::{Banner, RawBanner};
pub use bike::{Bike, BikeStatus, RawBike};
pub use booking::{Booking, BookingStatus, PaymentStatus, RawBooking};
pub use coupon::{Coupon, RawCoupon};
pub use id::EntityId;
pub use notification::{Notification, Priority, RawNotification};
pub use place::{Place, RawPlace};
pub use session::{RawLogin, Role, Session, SessionInfo};
pub use user::{RawUser, User};
