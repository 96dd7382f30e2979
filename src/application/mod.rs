pub mod checkout;
pub mod registration;

pub use checkout::CheckoutService;
pub use registration::RegistrationService;
