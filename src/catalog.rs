//! Static lookup tables behind the search form and the mock generator.

pub const PROFESSIONS: &[&str] = &[
    "Dentist", "Physician", "Orthopedic", "Cardiologist", "Dermatologist", "Physiotherapist",
    "Pediatrician", "ENT", "Gynecologist", "Neurologist", "Urologist", "Oncologist",
    "Psychiatrist", "General Surgeon", "Ophthalmologist", "Pulmonologist", "Gastroenterologist",
    "Nephrologist", "Rheumatologist", "Endocrinologist", "Plastic Surgeon", "Radiologist",
    "Anesthesiologist", "Homeopath", "Ayurvedic Doctor",
];

pub const BUSINESS_CATEGORIES: &[(&str, &[&str])] = &[
    ("Healthcare", &[
        "Dentist", "Physician", "Orthopedic", "Cardiologist", "Dermatologist", "Physiotherapist",
        "Pediatrician", "ENT", "Gynecologist", "Neurologist", "Urologist", "Oncologist",
        "Psychiatrist", "General Surgeon", "Ophthalmologist", "Pulmonologist", "Gastroenterologist",
        "Nephrologist", "Rheumatologist", "Endocrinologist", "Plastic Surgeon", "Radiologist",
        "Anesthesiologist", "Homeopath", "Ayurvedic Doctor", "Medical Clinic", "Hospital", "Pharmacy",
    ]),
    ("Retail", &[
        "Clothing Store", "Electronics Store", "Furniture Store", "Grocery Store", "Supermarket",
        "Shopping Mall", "Jewelry Store", "Bookstore", "Department Store", "Toy Store",
        "Hardware Store", "Home Decor", "Specialty Shop", "Gift Shop",
    ]),
    ("Food & Dining", &[
        "Restaurant", "Cafe", "Coffee Shop", "Bakery", "Fast Food", "Food Delivery",
        "Catering Service", "Food Truck", "Bar", "Pub", "Brewery", "Ice Cream Shop",
    ]),
    ("Professional Services", &[
        "Lawyer", "Accountant", "Financial Advisor", "Insurance Agent", "Real Estate Agent",
        "Marketing Agency", "Advertising Agency", "Business Consultant", "IT Consultant",
        "Web Development", "Software Company", "Staffing Agency", "PR Firm",
    ]),
    ("Education", &[
        "School", "College", "University", "Coaching Center", "Tutoring Service",
        "Training Institute", "Vocational School", "Computer Training", "Language School",
    ]),
    ("Personal Care", &[
        "Salon", "Spa", "Barbershop", "Beauty Parlor", "Nail Salon", "Massage Therapy",
        "Yoga Studio", "Gym", "Fitness Center", "Wellness Center",
    ]),
    ("Home Services", &[
        "Plumber", "Electrician", "Carpenter", "Interior Designer", "Cleaning Service",
        "Pest Control", "Landscaping", "Home Renovation", "Security Service", "HVAC Service",
    ]),
    ("Automotive", &[
        "Car Dealership", "Auto Repair", "Car Wash", "Auto Parts", "Tyre Shop",
        "Motorcycle Dealer", "Auto Body Shop", "Car Rental", "Towing Service",
    ]),
    ("Hospitality", &[
        "Hotel", "Resort", "Motel", "Guest House", "Vacation Rental", "Travel Agency",
        "Tour Operator", "Event Venue",
    ]),
    ("Entertainment", &[
        "Movie Theater", "Amusement Park", "Game Zone", "Bowling Alley", "Concert Venue",
        "Theater", "Museum", "Art Gallery", "Night Club", "Karaoke",
    ]),
];

// Tier 1 first, then tier 2.
pub const CITIES: &[&str] = &[
    "Mumbai", "Delhi", "Bangalore", "Hyderabad", "Chennai", "Kolkata", "Pune", "Ahmedabad",
    "Jaipur", "Lucknow", "Kanpur", "Nagpur", "Indore", "Bhopal", "Patna", "Ludhiana", "Agra",
    "Nashik", "Vadodara", "Faridabad", "Meerut", "Rajkot", "Varanasi", "Srinagar", "Aurangabad",
    "Dhanbad", "Amritsar", "Allahabad", "Ranchi", "Howrah", "Coimbatore", "Jabalpur", "Gwalior",
    "Vijayawada", "Jodhpur", "Madurai", "Raipur", "Kota", "Guwahati", "Chandigarh", "Solapur",
    "Hubli-Dharwad", "Mysore", "Tiruchirappalli", "Bareilly", "Aligarh", "Tiruppur", "Moradabad",
    "Jalandhar", "Bhubaneswar", "Salem", "Warangal", "Guntur", "Bhiwandi", "Saharanpur",
    "Gorakhpur", "Bikaner", "Amravati", "Noida", "Jamshedpur", "Bhilai", "Cuttack", "Firozabad",
    "Kochi", "Nellore", "Bhavnagar", "Dehradun", "Durgapur", "Asansol", "Rourkela", "Nanded",
    "Kolhapur", "Ajmer", "Akola", "Gulbarga", "Jamnagar", "Ujjain", "Loni", "Siliguri", "Jhansi",
    "Ulhasnagar", "Jammu", "Sangli-Miraj & Kupwad", "Mangalore", "Erode", "Belgaum", "Kurnool",
    "Ambattur", "Tirunelveli", "Malegaon", "Gaya", "Jalgaon", "Udaipur", "Maheshtala",
    "Davanagere", "Kozhikode",
];

const LOCALITIES: &[(&str, &[&str])] = &[
    ("Mumbai", &[
        "Andheri", "Bandra", "Borivali", "Colaba", "Dadar", "Goregaon", "Juhu", "Kandivali",
        "Malad", "Powai", "Thane", "Vile Parle", "Worli",
    ]),
    ("Delhi", &[
        "Connaught Place", "Dwarka", "Hauz Khas", "Karol Bagh", "Lajpat Nagar", "Rohini",
        "Saket", "Vasant Kunj",
    ]),
    ("Bangalore", &[
        "Indiranagar", "Jayanagar", "Koramangala", "Malleshwaram", "Whitefield",
        "HSR Layout", "Electronic City", "Hebbal",
    ]),
    ("Hyderabad", &[
        "Banjara Hills", "Gachibowli", "Hitech City", "Jubilee Hills", "Kukatpally",
        "Madhapur", "Secunderabad",
    ]),
    ("Chennai", &["Adyar", "Anna Nagar", "Besant Nagar", "T Nagar", "Velachery", "Mylapore"]),
    ("Kolkata", &["Ballygunge", "Park Street", "Salt Lake", "New Town", "Howrah", "Gariahat"]),
    ("Pune", &["Aundh", "Baner", "Hinjewadi", "Kothrud", "Koregaon Park", "Viman Nagar"]),
    ("Ahmedabad", &["Bodakdev", "Navrangpura", "Satellite", "Vastrapur", "Maninagar"]),
];

const STREETS: &[(&str, &[&str])] = &[
    ("Mumbai", &["MG Road", "SV Road", "Link Road", "Hill Road", "Turner Road", "Pali Hill", "Juhu Tara Road"]),
    ("Delhi", &["Connaught Place", "Barakhamba Road", "Chandni Chowk", "Rajpath", "Lodhi Road", "Janpath"]),
    ("Bangalore", &["MG Road", "Brigade Road", "100 Feet Road", "Commercial Street", "Residency Road", "Lavelle Road"]),
];

const DEFAULT_STREETS: &[&str] = &[
    "Main Street", "Park Avenue", "Gandhi Road", "Market Road", "Commercial Street", "Business Complex",
];

pub const DEFAULT_AREAS: &[&str] = &["Downtown", "Uptown", "Central", "West", "East", "North", "South"];

pub const FIRST_NAMES: &[&str] = &[
    "Amit", "Priya", "Rahul", "Neha", "Sanjay", "Divya", "Vijay", "Ananya", "Rajesh", "Meera",
    "Arun", "Pooja", "Arjun", "Deepa", "Kiran", "Nisha", "Vivek", "Sunita", "Mohit", "Anjali",
];

pub const LAST_NAMES: &[&str] = &[
    "Sharma", "Patel", "Singh", "Mehta", "Gupta", "Verma", "Iyer", "Joshi", "Kumar", "Reddy",
    "Desai", "Shah", "Agarwal", "Kapoor", "Chatterjee", "Bhatia", "Nair", "Das", "Rao", "Malhotra",
];

pub const EMAIL_DOMAINS: &[&str] = &[
    "gmail.com", "yahoo.com", "outlook.com", "hotmail.com", "business.co.in", "company.in", "protonmail.com",
];

pub const DEFAULT_CATEGORY: &str = "default";

const NAME_TEMPLATES: &[(&str, &[&str])] = &[
    ("Healthcare", &[
        "Dr. [FIRST] [LAST]", "[FIRST] [LAST], MD", "[LAST] Medical [BUSINESS]",
        "[FIRST] [LAST] [BUSINESS]", "[CITY] [BUSINESS]", "[LAST] [BUSINESS]",
    ]),
    ("Retail", &[
        "[FIRST]'s [BUSINESS]", "[LAST] [BUSINESS]", "The [BUSINESS] Shop",
        "[FIRST] & [FIRST] [BUSINESS]", "[CITY] [BUSINESS]", "Premium [BUSINESS]",
    ]),
    ("Food & Dining", &[
        "[FIRST]'s [BUSINESS]", "The [BUSINESS] House", "[LAST] [BUSINESS]",
        "[CITY] [BUSINESS]", "Royal [BUSINESS]", "Spice [BUSINESS]",
    ]),
    ("Professional Services", &[
        "[LAST] & Associates", "[FIRST] [LAST] [BUSINESS]", "[CITY] [BUSINESS] Services",
        "[LAST] & [LAST] [BUSINESS]", "Professional [BUSINESS]", "[FIRST] [LAST] Consultants",
    ]),
    ("Education", &[
        "[CITY] [BUSINESS] Institute", "[LAST] Academy", "[LAST] [BUSINESS] Center",
        "[FIRST] [BUSINESS] Classes", "Advanced [BUSINESS] Institute", "Excellence [BUSINESS] Academy",
    ]),
    ("Personal Care", &[
        "[FIRST]'s [BUSINESS]", "[LAST] [BUSINESS]", "Beauty [BUSINESS]",
        "Elite [BUSINESS]", "[CITY] [BUSINESS]", "Wellness [BUSINESS]",
    ]),
    ("Home Services", &[
        "[LAST] [BUSINESS]", "[CITY] [BUSINESS] Services", "[FIRST]'s [BUSINESS]",
        "Professional [BUSINESS]", "Home [BUSINESS] Experts", "Premier [BUSINESS] Services",
    ]),
    ("Automotive", &[
        "[LAST] [BUSINESS]", "[CITY] [BUSINESS]", "[FIRST]'s [BUSINESS]",
        "Premier [BUSINESS]", "Reliable [BUSINESS]", "Advanced [BUSINESS] Solutions",
    ]),
    ("Hospitality", &[
        "[BUSINESS] [CITY]", "The [BUSINESS] Inn", "Royal [BUSINESS]",
        "Grand [BUSINESS]", "Luxury [BUSINESS]", "[CITY] [BUSINESS] Suites",
    ]),
    ("Entertainment", &[
        "[CITY] [BUSINESS]", "[FIRST]'s [BUSINESS]", "The [BUSINESS] Zone",
        "Fun [BUSINESS]", "Premium [BUSINESS]", "Elite [BUSINESS]",
    ]),
    (DEFAULT_CATEGORY, &[
        "[FIRST] [LAST] [BUSINESS]", "[LAST] [BUSINESS]", "[CITY] [BUSINESS]",
        "The [BUSINESS] Place", "Premium [BUSINESS]", "[BUSINESS] Center",
    ]),
];

type Table = &'static [(&'static str, &'static [&'static str])];

fn lookup(table: Table, key: &str) -> Option<&'static [&'static str]> {
    table.iter().find(|(k, _)| *k == key).map(|(_, values)| *values)
}

pub fn localities_for_city(city: &str) -> &'static [&'static str] {
    lookup(LOCALITIES, city).unwrap_or(&[])
}

pub fn streets_for_city(city: Option<&str>) -> &'static [&'static str] {
    city.and_then(|c| lookup(STREETS, c)).unwrap_or(DEFAULT_STREETS)
}

pub fn name_templates(category: &str) -> &'static [&'static str] {
    lookup(NAME_TEMPLATES, category)
        .or_else(|| lookup(NAME_TEMPLATES, DEFAULT_CATEGORY))
        .unwrap_or(&[])
}

/// First known city whose name appears in `location`.
pub fn find_city(location: &str) -> Option<&'static str> {
    CITIES.iter().copied().find(|city| location.contains(city))
}

pub fn all_business_types() -> impl Iterator<Item = &'static str> {
    BUSINESS_CATEGORIES.iter().flat_map(|(_, types)| types.iter().copied())
}
