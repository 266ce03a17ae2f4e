use crate::store::student::Student;

/// Build the single user message sent to the model.
pub fn build_prompt(student: &Student) -> String {
    format!(
        "Generate a detailed summary based on the following details for the student:\n\
         Name: {}\n\
         Age: {}\n\
         Email: {}\n\
         Do not mention any generic or missing information, just create a professional summary based on the provided data.",
        student.name, student.age, student.email
    )
}
