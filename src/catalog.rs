//! Static course catalog and syllabus. Fixed by configuration, immutable at
//! runtime; the catalog's own ordering is the deterministic display order.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use serde::Serialize;

pub type CourseId = u32;

#[derive(Debug, Clone, Serialize)]
pub struct Course {
    pub id: CourseId,
    pub title: &'static str,
    pub description: &'static str,
    pub duration: &'static str,
    pub rating: f32,
    pub students: u32,
    pub category: &'static str,
    pub image: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyllabusSection {
    pub title: &'static str,
    pub topics: &'static [&'static str],
}

pub static COURSES: Lazy<Vec<Course>> = Lazy::new(|| {
    vec![
        Course {
            id: 1,
            title: "K-CET Agriculture Crash Course",
            description: "Intensive preparation for Karnataka Common Entrance Test for Agriculture seats. Covers Physics, Chemistry, Mathematics, and Biology as per latest syllabus.",
            duration: "3 Months",
            rating: 4.9,
            students: 1200,
            category: "Entrance Exam",
            image: "https://images.unsplash.com/photo-1595838788831-3683e3b03d56?auto=format&fit=crop&q=80&w=1000",
        },
        Course {
            id: 2,
            title: "ICAR AIEEA UG Complete Guide",
            description: "Comprehensive coaching for Indian Council of Agricultural Research All India Entrance Examination for Admission. Includes mock tests and study material.",
            duration: "6 Months",
            rating: 4.8,
            students: 850,
            category: "National Level",
            image: "https://images.unsplash.com/photo-1625246333195-58197bd47d26?auto=format&fit=crop&q=80&w=1000",
        },
        Course {
            id: 3,
            title: "B.Sc Agriculture Fundamentals",
            description: "Foundation course for first-year B.Sc Agriculture students. Covers basic concepts of Agronomy, Soil Science, and Plant Pathology.",
            duration: "4 Months",
            rating: 4.7,
            students: 500,
            category: "Academic",
            image: "https://images.unsplash.com/photo-1530836369250-ef72a3f5cda8?auto=format&fit=crop&q=80&w=1000",
        },
        Course {
            id: 4,
            title: "Agri-Business Management",
            description: "Learn the business side of agriculture. Topics include supply chain management, farm economics, and agricultural marketing.",
            duration: "5 Months",
            rating: 4.8,
            students: 300,
            category: "Professional",
            image: "https://images.unsplash.com/photo-1560493676-04071c5f467b?auto=format&fit=crop&q=80&w=1000",
        },
        Course {
            id: 5,
            title: "Practical Organic Farming",
            description: "Hands-on guide to organic farming techniques, certification processes, and market opportunities for organic produce.",
            duration: "2 Months",
            rating: 4.9,
            students: 600,
            category: "Skill Development",
            image: "https://images.unsplash.com/photo-1500937386664-56d1dfef3854?auto=format&fit=crop&q=80&w=1000",
        },
        Course {
            id: 6,
            title: "Horticulture Specialization",
            description: "Detailed study of fruit and vegetable crops, floriculture, and landscaping. Ideal for those interested in garden crops.",
            duration: "3 Months",
            rating: 4.6,
            students: 450,
            category: "Specialization",
            image: "https://images.unsplash.com/photo-1585320806297-9794b3e4eeae?auto=format&fit=crop&q=80&w=1000",
        },
    ]
});

pub static SYLLABUS: Lazy<Vec<SyllabusSection>> = Lazy::new(|| {
    vec![
        SyllabusSection {
            title: "Crop Production",
            topics: &[
                "Classification of crops",
                "Tillage and tilth",
                "Seeds and sowing",
                "Nutrient management",
                "Irrigation management",
                "Weed management",
                "Cropping systems",
                "Harvesting and storage",
            ],
        },
        SyllabusSection {
            title: "Soil Science",
            topics: &[
                "Soil formation and composition",
                "Physical properties of soil",
                "Chemical properties of soil",
                "Soil organic matter",
                "Soil pollution",
                "Soil conservation",
                "Problematic soils and management",
            ],
        },
        SyllabusSection {
            title: "Plant Protection",
            topics: &[
                "Important insect pests of crops",
                "Integrated Pest Management (IPM)",
                "Plant diseases and their symptoms",
                "Principles of plant disease control",
                "Pesticides and fungicides",
                "Safety measures in pesticide application",
            ],
        },
        SyllabusSection {
            title: "Agriculture Engineering",
            topics: &[
                "Farm implements and machinery",
                "Tillage implements",
                "Sowing and planting equipment",
                "Plant protection equipment",
                "Harvesting and threshing equipment",
                "Farm power sources",
                "Surveying and levelling",
            ],
        },
        SyllabusSection {
            title: "Horticulture",
            topics: &[
                "Importance of horticulture",
                "Propagation methods",
                "Cultivation of fruit crops",
                "Cultivation of vegetable crops",
                "Floriculture and landscaping",
                "Post-harvest technology",
                "Medicinal and aromatic plants",
            ],
        },
    ]
});

pub fn course_by_id(id: CourseId) -> Option<&'static Course> {
    COURSES.iter().find(|c| c.id == id)
}

/// Join an enrollment set against the catalog. Output follows catalog order,
/// not enrollment insertion order.
pub fn courses_for(ids: &BTreeSet<CourseId>) -> Vec<&'static Course> {
    COURSES.iter().filter(|c| ids.contains(&c.id)).collect()
}
