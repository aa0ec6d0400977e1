pub mod attendance;
pub mod attendance_admin;
pub mod department;
