/// Faculty roster, kept lexically sorted. Teacher identity is a closed set,
/// not a managed account table; ordering everywhere follows this constant.
pub const TEACHERS: [&str; 3] = ["Chanchal Sir", "Tayyab Sir", "Vinay Sir"];

/// Branches a group can belong to.
pub const BRANCHES: [&str; 3] = ["IT", "CSE-A", "CSE-B"];

/// Hard cap on groups supervised by one teacher.
pub const MAX_GROUPS_PER_TEACHER: i64 = 6;

pub const MIN_GROUP_NUMBER: i64 = 1;
pub const MAX_GROUP_NUMBER: i64 = 6;

pub const MIN_PROGRESS: i64 = 0;
pub const MAX_PROGRESS: i64 = 100;

pub fn is_known_teacher(name: &str) -> bool {
    TEACHERS.contains(&name)
}

pub fn is_known_branch(name: &str) -> bool {
    BRANCHES.contains(&name)
}

pub fn is_valid_group_number(n: i64) -> bool {
    (MIN_GROUP_NUMBER..=MAX_GROUP_NUMBER).contains(&n)
}

pub fn is_valid_progress(n: i64) -> bool {
    (MIN_PROGRESS..=MAX_PROGRESS).contains(&n)
}

/// Mobile numbers are exactly 10 digits, no separators.
pub fn is_valid_mobile(s: &str) -> bool {
    s.len() == 10 && s.chars().all(|c| c.is_ascii_digit())
}

/// Roll numbers are exactly 8 digits.
pub fn is_valid_roll_no(s: &str) -> bool {
    s.len() == 8 && s.chars().all(|c| c.is_ascii_digit())
}
