pub mod clinic_service;
pub mod doctor_service;
pub mod patient_service;
pub mod appointment_service;
pub mod user_service;
