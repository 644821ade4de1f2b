use crate::models::{Application, ApplicationStatus, Project, Role, User};

/// Default page size for list-returning operations
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// 1-indexed page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: usize,
    pub size: usize,
}

impl Page {
    /// Build a page from raw query values. Non-positive or missing page
    /// numbers become 1; non-positive or missing sizes become `default_size`.
    pub fn new(page: Option<i64>, size: Option<i64>, default_size: usize) -> Self {
        let number = page.filter(|p| *p > 0).map(|p| p as usize).unwrap_or(1);
        let size = size
            .filter(|s| *s > 0)
            .map(|s| s as usize)
            .unwrap_or(default_size.max(1));
        Self { number, size }
    }

    pub fn offset(&self) -> usize {
        self.number.saturating_sub(1).saturating_mul(self.size)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            number: 1,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Slice out one page. Pages past the end yield an empty vector.
pub fn paginate<T, I>(items: I, page: Page) -> Vec<T>
where
    I: IntoIterator<Item = T>,
{
    items
        .into_iter()
        .skip(page.offset())
        .take(page.size)
        .collect()
}

/// Filters for application listings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplicationFilter {
    pub project_id: Option<i64>,
    pub status: Option<ApplicationStatus>,
}

impl ApplicationFilter {
    #[inline]
    pub fn matches(&self, application: &Application) -> bool {
        if let Some(project_id) = self.project_id {
            if application.project_id != project_id {
                return false;
            }
        }
        if let Some(ref status) = self.status {
            if &application.status != status {
                return false;
            }
        }
        true
    }
}

/// Filters for project listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectFilter {
    pub teacher_id: Option<i64>,
    pub archived: Option<bool>,
}

impl ProjectFilter {
    #[inline]
    pub fn matches(&self, project: &Project) -> bool {
        if let Some(teacher_id) = self.teacher_id {
            if project.teacher_id != teacher_id {
                return false;
            }
        }
        if let Some(archived) = self.archived {
            if project.archived != archived {
                return false;
            }
        }
        true
    }
}

/// Role filter for user listings
#[inline]
pub fn matches_role(user: &User, role: Option<Role>) -> bool {
    role.map_or(true, |r| user.role == r)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_defaults() {
        assert_eq!(Page::new(None, None, 50), Page { number: 1, size: 50 });
        assert_eq!(Page::new(Some(0), Some(-3), 50), Page { number: 1, size: 50 });
        assert_eq!(Page::new(Some(3), Some(10), 50).offset(), 20);
    }

    #[test]
    fn test_paginate_out_of_range_is_empty() {
        let items: Vec<u32> = (1..=5).collect();
        assert_eq!(paginate(items.clone(), Page { number: 2, size: 2 }), vec![3, 4]);
        assert_eq!(paginate(items.clone(), Page { number: 3, size: 2 }), vec![5]);
        assert!(paginate(items, Page { number: 9, size: 2 }).is_empty());
    }

    #[test]
    fn test_page_zero_reads_as_first_page() {
        let page = Page { number: 0, size: 2 };
        assert_eq!(page.offset(), 0);
        assert_eq!(paginate(vec![1, 2, 3], page), vec![1, 2]);
    }

    #[test]
    fn test_application_filter() {
        let app = Application {
            id: 1,
            student_id: 2,
            project_id: 3,
            status: ApplicationStatus::Submitted,
        };
        assert!(ApplicationFilter::default().matches(&app));
        assert!(ApplicationFilter {
            project_id: Some(3),
            status: Some(ApplicationStatus::Submitted),
        }
        .matches(&app));
        assert!(!ApplicationFilter {
            project_id: Some(4),
            status: None,
        }
        .matches(&app));
        assert!(!ApplicationFilter {
            project_id: None,
            status: Some(ApplicationStatus::Approved),
        }
        .matches(&app));
    }

    #[test]
    fn test_project_filter() {
        let project = Project {
            id: 1,
            teacher_id: 7,
            title: "t".to_string(),
            description: "d".to_string(),
            requirements: vec![],
            tags: vec![],
            archived: true,
        };
        assert!(ProjectFilter { teacher_id: Some(7), archived: Some(true) }.matches(&project));
        assert!(!ProjectFilter { teacher_id: None, archived: Some(false) }.matches(&project));
    }
}
