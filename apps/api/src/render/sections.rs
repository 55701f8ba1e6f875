//! The application form's fixed layout: which sections appear, in what order,
//! and which form fields feed each `Label: value` line.

/// One `Label: value` line. `keys` are tried in order; the first non-blank wins.
#[derive(Debug)]
pub struct FieldSpec {
    pub label: &'static str,
    pub keys: &'static [&'static str],
}

#[derive(Debug)]
pub struct SectionSpec {
    pub heading: &'static str,
    pub fields: &'static [FieldSpec],
}

#[derive(Debug)]
pub enum LayoutBlock {
    Section(&'static SectionSpec),
    PageBreak,
}

const fn field(label: &'static str, keys: &'static [&'static str]) -> FieldSpec {
    FieldSpec { label, keys }
}

pub static PERSONAL: SectionSpec = SectionSpec {
    heading: "Personal Information",
    fields: &[
        field("Full Name", &["fullname", "fullName"]),
        field("Email", &["email"]),
        field("Phone", &["phone"]),
        field("Address", &["address"]),
        field("DOB", &["dob"]),
        field("Aadhar No", &["aadhar"]),
        field("Blood Group", &["bloodGroup"]),
        field("Marital Status", &["maritalStatus"]),
        field("Years of Work", &["yearsOfWork"]),
        field("Employment Type", &["employmentType"]),
        field("Position", &["position"]),
        field("Application Date", &["applicationDate"]),
    ],
};

pub static EDUCATION: SectionSpec = SectionSpec {
    heading: "Educational Background",
    fields: &[
        field("Degree", &["degree"]),
        field("Institute", &["institute"]),
        field("Year", &["year"]),
        field("Grade", &["grade"]),
        field("City", &["city"]),
    ],
};

pub static EMPLOYMENT: SectionSpec = SectionSpec {
    heading: "Employment History",
    fields: &[
        field("Company", &["company"]),
        field("Position", &["positionHistory"]),
        field("Years", &["yearHistory"]),
        field("Reason for Leaving", &["reason"]),
    ],
};

pub static SKILLS: SectionSpec = SectionSpec {
    heading: "Skills & Training",
    fields: &[
        field("Achievement", &["achievement"]),
        field("Level", &["level"]),
        field("Year", &["yearSkill"]),
        field("Institute", &["skillInstitute"]),
    ],
};

pub static FAMILY: SectionSpec = SectionSpec {
    heading: "Family Details",
    fields: &[
        field("Name", &["familyName"]),
        field("Relation", &["familyRelation"]),
        field("Occupation", &["familyOccupation"]),
    ],
};

pub static EMERGENCY: SectionSpec = SectionSpec {
    heading: "Emergency Contact",
    fields: &[
        field("Name", &["emergencyName"]),
        field("Relation", &["emergencyRelation"]),
        field("Occupation", &["emergencyOccupation"]),
        field("Qualification", &["emergencyQualification"]),
        field("City", &["emergencyCity"]),
    ],
};

pub static JOINING: SectionSpec = SectionSpec {
    heading: "Joining Details",
    fields: &[
        field("Joining Date", &["joiningDate"]),
        field("Fees", &["fees"]),
        field("Installment 1", &["installment1"]),
        field("Installment 2", &["installment2"]),
        field("Installment 3", &["installment3"]),
    ],
};

pub static OFFICE_USE: SectionSpec = SectionSpec {
    heading: "Office Use",
    fields: &[
        field("Company Name", &["companyName"]),
        field("Receiving Person", &["receivingPerson"]),
    ],
};

/// Rendered top to bottom. Everything after the page break lands on page two.
pub static FORM_LAYOUT: &[LayoutBlock] = &[
    LayoutBlock::Section(&PERSONAL),
    LayoutBlock::Section(&EDUCATION),
    LayoutBlock::Section(&EMPLOYMENT),
    LayoutBlock::Section(&SKILLS),
    LayoutBlock::PageBreak,
    LayoutBlock::Section(&FAMILY),
    LayoutBlock::Section(&EMERGENCY),
    LayoutBlock::Section(&JOINING),
    LayoutBlock::Section(&OFFICE_USE),
];

/// Section headings in layout order.
#[cfg(test)]
pub fn headings() -> impl Iterator<Item = &'static str> {
    FORM_LAYOUT.iter().filter_map(|block| match block {
        LayoutBlock::Section(section) => Some(section.heading),
        LayoutBlock::PageBreak => None,
    })
}
