//! Parsers for portal markup.
//!
//! Each parser is a pure function from a response body to domain records and
//! owns a typed selector table describing the markup it expects. Markup that
//! drifts outside those selectors yields an empty result, never an error.
//!
//! - [`parse_course_list`] - XML envelope with the term and course catalog
//! - [`parse_sidebar`] - course navigation menu
//! - [`parse_page`] - content items and their attachments

mod course_list;
mod error;
mod page;
mod sidebar;
mod term;
pub mod text;

pub use course_list::{
    Announcement, Course, CoursesByTerm, TermCourses, parse_course_list, parse_course_list_html,
};
pub use error::ParseError;
pub use page::{FileLink, PageSection, parse_page};
pub use sidebar::{Link, Sidebar, SidebarCategory, parse_sidebar};
pub use term::term_id_from_heading;
