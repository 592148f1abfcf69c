//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod academic_year;
pub mod branch;
pub mod college;
pub mod course;
pub mod logbook_entry;
pub mod logbook_template;
pub mod module;
pub mod phase;
pub mod student_profile;
pub mod student_subject;
pub mod subject;
pub mod teacher_profile;
pub mod teacher_subject;
pub mod user;

// Re-export specific types to avoid conflicts
pub use academic_year::{Entity as AcademicYear, Model as AcademicYearModel};
pub use branch::{Entity as Branch, Model as BranchModel};
pub use college::{Entity as College, Model as CollegeModel};
pub use course::{Entity as Course, Model as CourseModel};
pub use logbook_entry::{Entity as LogBookEntry, Model as LogBookEntryModel};
pub use logbook_template::{Entity as LogBookTemplate, Model as LogBookTemplateModel, TemplateType};
pub use module::{Entity as Module, Model as ModuleModel};
pub use phase::{Entity as Phase, Model as PhaseModel};
pub use student_profile::{Entity as StudentProfile, Model as StudentProfileModel, VerificationStatus};
pub use student_subject::{Entity as StudentSubject, Model as StudentSubjectModel};
pub use subject::{Entity as Subject, Model as SubjectModel};
pub use teacher_profile::{Entity as TeacherProfile, Model as TeacherProfileModel};
pub use teacher_subject::{Entity as TeacherSubject, Model as TeacherSubjectModel};
pub use user::{Entity as User, Model as UserModel, Role};
